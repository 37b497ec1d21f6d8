use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::{debug, info};

use lookml_core::{collect_lookml_files, GrapherConfig};
use lookml_parser::{parse_file, parse_str, Block, LookmlFile};

use crate::error::Result;
use crate::render::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Model,
    Explore,
    View,
    Orphan,
}

impl NodeKind {
    pub fn color(&self) -> &'static str {
        match self {
            NodeKind::Model => "dodgerblue",
            NodeKind::Explore => "mediumseagreen",
            NodeKind::View => "sandybrown",
            NodeKind::Orphan => "lightcoral",
        }
    }
}

/// Accumulates the model → explore → view dependency structure over a set of
/// LookML files and renders it as a diagram.
pub struct LookmlGrapher {
    config: GrapherConfig,
    pub node_map: BTreeMap<String, NodeKind>,
    pub models_to_explores: Vec<(String, String)>,
    pub explores_to_views: Vec<(String, String)>,
}

impl LookmlGrapher {
    pub fn new(config: GrapherConfig) -> Self {
        Self {
            config,
            node_map: BTreeMap::new(),
            models_to_explores: Vec::new(),
            explores_to_views: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Model name for a model file: `foo.model.lkml` → `foo`.
    fn model_name(path: &Path) -> String {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        stem.strip_suffix(".model").unwrap_or(&stem).to_string()
    }

    pub fn process_file(&mut self, path: &Path) -> Result<()> {
        let parsed = parse_file(path)?;
        self.process_parsed(path, &parsed);
        Ok(())
    }

    /// Same as [`process_file`](Self::process_file) for already-loaded source
    /// text, used when reading blobs out of git history.
    pub fn process_source(&mut self, path: &Path, source: &str) -> Result<()> {
        let parsed = parse_str(source)?;
        self.process_parsed(path, &parsed);
        Ok(())
    }

    fn process_parsed(&mut self, path: &Path, file: &LookmlFile) {
        for view in file.views() {
            debug!("Found view {}", view.name);
            self.node_map
                .entry(view.name.to_string())
                .or_insert(NodeKind::View);
        }

        let explores = file.explores();
        if !explores.is_empty() {
            let model = Self::model_name(path);
            debug!("Found model {}", model);
            self.node_map.insert(model.clone(), NodeKind::Model);
            for explore in explores {
                self.process_explore(&model, explore);
            }
        }
    }

    fn process_explore(&mut self, model: &str, explore: &Block) {
        let name = explore.name.clone().unwrap_or_default();
        self.node_map.insert(name.clone(), NodeKind::Explore);
        self.models_to_explores
            .push((model.to_string(), name.clone()));

        // the view the explore exposes directly: `from`/`view_name`,
        // falling back to the explore's own name
        let base = explore
            .pair("from")
            .or_else(|| explore.pair("view_name"))
            .and_then(|v| v.as_text())
            .unwrap_or(&name)
            .to_string();
        self.explores_to_views.push((name.clone(), base));

        for join in explore.blocks_of("join") {
            let view = join
                .pair("from")
                .or_else(|| join.pair("view_name"))
                .and_then(|v| v.as_text())
                .map(str::to_string)
                .or_else(|| join.name.clone());
            if let Some(view) = view {
                self.explores_to_views.push((name.clone(), view));
            }
        }
    }

    /// Re-tag views that appear in no edge as orphans.
    pub fn tag_orphans(&mut self) {
        let mut connected: BTreeSet<&String> = BTreeSet::new();
        for (a, b) in self.models_to_explores.iter().chain(&self.explores_to_views) {
            connected.insert(a);
            connected.insert(b);
        }
        let orphans: Vec<String> = self
            .node_map
            .iter()
            .filter(|(name, kind)| **kind == NodeKind::View && !connected.contains(name))
            .map(|(name, _)| name.clone())
            .collect();
        for name in orphans {
            self.node_map.insert(name, NodeKind::Orphan);
        }
    }

    pub fn orphans(&self) -> BTreeSet<String> {
        self.node_map
            .iter()
            .filter(|(_, kind)| **kind == NodeKind::Orphan)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Project the accumulated node and edge maps into a directed graph.
    /// Names that only appear on an edge, such as views referenced from an
    /// explore but defined in a file outside the input set, become nodes too.
    pub fn create_graph(&self) -> DiGraph<String, ()> {
        let mut graph = DiGraph::new();
        let mut indices: HashMap<&String, NodeIndex> = HashMap::new();
        for name in self.node_map.keys() {
            indices.insert(name, graph.add_node(name.clone()));
        }
        for (a, b) in self.models_to_explores.iter().chain(&self.explores_to_views) {
            let ia = *indices.entry(a).or_insert_with(|| graph.add_node(a.clone()));
            let ib = *indices.entry(b).or_insert_with(|| graph.add_node(b.clone()));
            graph.add_edge(ia, ib, ());
        }
        graph
    }

    /// DOT representation of [`create_graph`](Self::create_graph) with
    /// per-kind node colors; edge-only nodes render as plain views.
    pub fn to_dot(&self, title: Option<&str>) -> String {
        let graph = self.create_graph();
        let mut dot = String::from("digraph lookml {\n  rankdir=LR;\n");
        if let Some(title) = title {
            dot.push_str(&format!("  label=\"{}\";\n  labelloc=t;\n", title));
        }
        for idx in graph.node_indices() {
            let name = &graph[idx];
            let kind = self.node_map.get(name).copied().unwrap_or(NodeKind::View);
            dot.push_str(&format!(
                "  \"{}\" [style=filled, fillcolor={}];\n",
                name,
                kind.color()
            ));
        }
        for edge in graph.edge_references() {
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\";\n",
                graph[edge.source()],
                graph[edge.target()]
            ));
        }
        dot.push_str("}\n");
        dot
    }

    /// Process every LookML file under `dir`, tag orphans, and write the
    /// rendered graph to the configured output path.
    pub fn run(&mut self, dir: &Path, globs: &[String]) -> Result<()> {
        for file in collect_lookml_files(dir, globs)? {
            self.process_file(&file)?;
        }
        self.tag_orphans();
        info!(
            "Graph has {} nodes and {} edges",
            self.node_map.len(),
            self.models_to_explores.len() + self.explores_to_views.len()
        );

        let title = self.config.title.clone().unwrap_or_else(|| {
            format!("LookML dependencies, {}", chrono::Local::now().format("%Y-%m-%d"))
        });
        let dot = self.to_dot(Some(&title));
        let renderer = Renderer::new(&self.config.render_engine);
        renderer.render(&dot, &self.config.output)?;
        Ok(())
    }
}
