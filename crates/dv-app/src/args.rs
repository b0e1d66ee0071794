//! Parsing of the `--filter` and `--select` arguments

use anyhow::{anyhow, bail, Context, Result};
use dv_core::{SelectionEvent, ViewKind};
use dv_data::FilterSpec;

/// `COL=MIN..MAX` for a numeric range, `COL=a,b,c` for a value selection
pub fn parse_filter(arg: &str) -> Result<(String, FilterSpec)> {
    let (column, rule) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("filter '{}' must look like COL=MIN..MAX or COL=a,b", arg))?;
    let column = column.trim();
    if column.is_empty() {
        bail!("filter '{}' has no column", arg);
    }

    let spec = match rule.split_once("..") {
        Some((min, max)) => {
            let min: f64 = min
                .trim()
                .parse()
                .with_context(|| format!("bad lower bound in filter '{}'", arg))?;
            let max: f64 = max
                .trim()
                .parse()
                .with_context(|| format!("bad upper bound in filter '{}'", arg))?;
            FilterSpec::range(min, max)
        }
        None => FilterSpec::one_of(
            rule.split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty()),
        ),
    };
    Ok((column.to_string(), spec))
}

/// `VIEW:COL[,COL]=ID[,ID]`; an empty id list clears every view
pub fn parse_selection(arg: &str) -> Result<SelectionEvent> {
    let (view, rest) = arg
        .split_once(':')
        .ok_or_else(|| anyhow!("selection '{}' must look like VIEW:COL=ID[,ID]", arg))?;
    let view = ViewKind::from_name(view.trim()).ok_or_else(|| {
        let known: Vec<&str> = ViewKind::ALL.iter().map(ViewKind::name).collect();
        anyhow!("unknown view '{}' (expected one of {})", view, known.join(", "))
    })?;
    let (columns, ids) = rest
        .split_once('=')
        .ok_or_else(|| anyhow!("selection '{}' is missing '=ID'", arg))?;

    let ids: Vec<String> = ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect();
    if ids.is_empty() {
        return Ok(SelectionEvent::clear(view));
    }

    let columns: Vec<&str> = columns
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    match columns.as_slice() {
        [] => bail!("selection '{}' names no column", arg),
        [column] => Ok(SelectionEvent::new(view, column, ids)),
        _ => Ok(SelectionEvent::across(view, &columns, ids)),
    }
}
