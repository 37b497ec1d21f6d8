use std::fs;
use std::path::Path;

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, tag, take_until, take_while1},
    character::complete::{char, multispace1, none_of, not_line_ending},
    combinator::{map, opt, peek, value},
    multi::{many0_count, separated_list0},
    sequence::{delimited, pair, preceded},
    IResult,
};

use lookml_core::{LookmlError, Result};

use crate::ast::{Block, LookmlFile, Value};

enum Item {
    Pair(String, Value),
    Block(Block),
}

/// Whitespace and `#` line comments.
fn sp(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0_count(alt((
            value((), multispace1),
            value((), pair(char('#'), not_line_ending)),
        ))),
    )(input)
}

fn ident(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn bare_word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && !"{}[],:#\"".contains(c))(input)
}

/// Double-quoted string; `\"` and `\\` escapes; newlines are allowed inside.
fn quoted_string(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        map(
            opt(escaped_transform(
                none_of("\\\""),
                '\\',
                alt((value('\\', char('\\')), value('"', char('"')))),
            )),
            Option::unwrap_or_default,
        ),
        char('"'),
    )(input)
}

/// `sql_*` and `html` values run to the `;;` terminator.
fn sql_value(input: &str) -> IResult<&str, Value> {
    let (input, body) = take_until(";;")(input)?;
    let (input, _) = tag(";;")(input)?;
    Ok((input, Value::Sql(body.trim().to_string())))
}

fn list_value(input: &str) -> IResult<&str, Value> {
    let (input, items) = delimited(
        char('['),
        separated_list0(
            preceded(sp, char(',')),
            preceded(sp, alt((quoted_string, map(bare_word, str::to_string)))),
        ),
        preceded(sp, char(']')),
    )(input)?;
    Ok((input, Value::List(items)))
}

fn is_sql_key(key: &str) -> bool {
    key.starts_with("sql") || key == "html"
}

/// Brace-delimited body: nested pairs and blocks up to the closing brace.
fn block_body(input: &str) -> IResult<&str, (Vec<(String, Value)>, Vec<Block>)> {
    let (input, _) = char('{')(input)?;
    let (mut input, _) = sp(input)?;
    let mut pairs = Vec::new();
    let mut blocks = Vec::new();
    loop {
        if let Ok((rest, _)) = char::<_, nom::error::Error<&str>>('}')(input) {
            return Ok((rest, (pairs, blocks)));
        }
        let (rest, parsed) = item(input)?;
        match parsed {
            Item::Pair(k, v) => pairs.push((k, v)),
            Item::Block(b) => blocks.push(b),
        }
        let (rest, _) = sp(rest)?;
        input = rest;
    }
}

/// One `key: value` pair or `key: [name] { ... }` block.
fn item(input: &str) -> IResult<&str, Item> {
    let (input, key) = ident(input)?;
    let (input, _) = preceded(sp, char(':'))(input)?;
    let (input, _) = sp(input)?;

    if is_sql_key(key) {
        let (input, v) = sql_value(input)?;
        return Ok((input, Item::Pair(key.to_string(), v)));
    }
    if input.starts_with('{') {
        // anonymous block, e.g. derived_table: { ... }
        let (input, (pairs, blocks)) = block_body(input)?;
        return Ok((
            input,
            Item::Block(Block {
                kind: key.to_string(),
                name: None,
                pairs,
                blocks,
            }),
        ));
    }
    if input.starts_with('"') {
        let (input, s) = quoted_string(input)?;
        return Ok((input, Item::Pair(key.to_string(), Value::Quoted(s))));
    }
    if input.starts_with('[') {
        let (input, v) = list_value(input)?;
        return Ok((input, Item::Pair(key.to_string(), v)));
    }

    let (rest, word) = bare_word(input)?;
    let (at_brace, brace) = opt(preceded(sp, peek(char('{'))))(rest)?;
    if brace.is_some() {
        let (rest, (pairs, blocks)) = block_body(at_brace)?;
        Ok((
            rest,
            Item::Block(Block {
                kind: key.to_string(),
                name: Some(word.to_string()),
                pairs,
                blocks,
            }),
        ))
    } else {
        Ok((rest, Item::Pair(key.to_string(), Value::Scalar(word.to_string()))))
    }
}

fn line_of(source: &str, rest: &str) -> usize {
    let consumed = source.len() - rest.len();
    source[..consumed].bytes().filter(|&b| b == b'\n').count() + 1
}

/// Parse LookML source text into its structural tree.
pub fn parse_str(source: &str) -> Result<LookmlFile> {
    let mut file = LookmlFile::default();
    let mut input = source;
    loop {
        let (rest, _) = sp(input)
            .map_err(|_| LookmlError::Format("invalid LookML input".to_string()))?;
        if rest.is_empty() {
            break;
        }
        match item(rest) {
            Ok((next, Item::Pair(k, v))) => {
                file.pairs.push((k, v));
                input = next;
            }
            Ok((next, Item::Block(b))) => {
                file.blocks.push(b);
                input = next;
            }
            Err(_) => {
                return Err(LookmlError::Format(format!(
                    "unparseable LookML at line {}",
                    line_of(source, rest)
                )));
            }
        }
    }
    Ok(file)
}

/// Parse a LookML file from disk.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<LookmlFile> {
    let source = fs::read_to_string(path.as_ref())?;
    let file = parse_str(&source)?;
    if file.is_empty() {
        return Err(LookmlError::Format(format!(
            "no recognizable LookML constructs in {}",
            path.as_ref().display()
        )));
    }
    Ok(file)
}
