//! MCP Relational Operation Handlers
//!
//! Each handler reads one or two tables by handle and returns the summary of
//! the derived table (`handle`, `rows`, `columns`, `column_names`).

use crate::mcp::handlers::{parse_params, to_result, OneOrMany};
use crate::mcp::types::MCPError;
use crate::operations::{AggFunction, Aggregation, JoinType, SortKey};
use crate::services::DataService;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

const DEFAULT_WINDOW: usize = 5;

/// Parameters for filter
#[derive(Debug, Deserialize)]
pub struct FilterParams {
    pub data_ref: String,
    pub condition: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Parameters for select
#[derive(Debug, Deserialize)]
pub struct SelectParams {
    pub data_ref: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Parameters for groupby
#[derive(Debug, Deserialize)]
pub struct GroupByParams {
    pub data_ref: String,
    pub by: OneOrMany<String>,
    /// Column name to one function name or a list of them, in output order
    pub agg: Map<String, Value>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Parameters for join
#[derive(Debug, Deserialize)]
pub struct JoinParams {
    pub left_ref: String,
    pub right_ref: String,
    /// Key columns; the common columns when absent
    #[serde(default)]
    pub on: Option<OneOrMany<String>>,
    #[serde(default)]
    pub how: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Parameters for sort
#[derive(Debug, Deserialize)]
pub struct SortParams {
    pub data_ref: String,
    pub by: OneOrMany<String>,
    /// One flag for every key, or one per key
    #[serde(default)]
    pub ascending: Option<OneOrMany<bool>>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Parameters for head and tail
#[derive(Debug, Deserialize)]
pub struct WindowParams {
    pub data_ref: String,
    #[serde(default = "default_window")]
    pub n: usize,
    #[serde(default)]
    pub name: Option<String>,
}

fn default_window() -> usize {
    DEFAULT_WINDOW
}

/// Parameters for describe
#[derive(Debug, Deserialize)]
pub struct DescribeParams {
    pub data_ref: String,
    #[serde(default)]
    pub name: Option<String>,
}

fn parse_aggregations(agg: Map<String, Value>) -> Result<Vec<Aggregation>, MCPError> {
    agg.into_iter()
        .map(|(column, spec)| {
            let names: OneOrMany<String> = serde_json::from_value(spec).map_err(|_| {
                MCPError::invalid_params(format!(
                    "Aggregation for '{}' must be a function name or a list of names",
                    column
                ))
            })?;
            let functions = names
                .into_vec()
                .iter()
                .map(|name| name.parse::<AggFunction>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(MCPError::invalid_params)?;
            if functions.is_empty() {
                return Err(MCPError::invalid_params(format!(
                    "Aggregation for '{}' lists no functions",
                    column
                )));
            }
            Ok(Aggregation::new(column, functions))
        })
        .collect()
}

fn sort_keys(by: Vec<String>, ascending: Option<OneOrMany<bool>>) -> Result<Vec<SortKey>, MCPError> {
    let flags = match ascending {
        None => vec![true; by.len()],
        Some(OneOrMany::One(flag)) => vec![flag; by.len()],
        Some(OneOrMany::Many(flags)) if flags.len() == by.len() => flags,
        Some(OneOrMany::Many(flags)) => {
            return Err(MCPError::invalid_params(format!(
                "ascending has {} entries but {} sort columns were given",
                flags.len(),
                by.len()
            )))
        }
    };
    Ok(by
        .into_iter()
        .zip(flags)
        .map(|(column, ascending)| SortKey { column, ascending })
        .collect())
}

pub async fn handle_filter(service: &Arc<DataService>, params: Value) -> Result<Value, MCPError> {
    let params: FilterParams = parse_params(params)?;
    let derived = service
        .filter(&params.data_ref, &params.condition, params.name)
        .await?;
    to_result(derived)
}

pub async fn handle_select(service: &Arc<DataService>, params: Value) -> Result<Value, MCPError> {
    let params: SelectParams = parse_params(params)?;
    let derived = service
        .select(&params.data_ref, params.columns, params.name)
        .await?;
    to_result(derived)
}

pub async fn handle_groupby(service: &Arc<DataService>, params: Value) -> Result<Value, MCPError> {
    let params: GroupByParams = parse_params(params)?;
    let aggregations = parse_aggregations(params.agg)?;
    let derived = service
        .group_by(&params.data_ref, params.by.into_vec(), aggregations, params.name)
        .await?;
    to_result(derived)
}

pub async fn handle_join(service: &Arc<DataService>, params: Value) -> Result<Value, MCPError> {
    let params: JoinParams = parse_params(params)?;
    let how = match params.how.as_deref() {
        Some(how) => how.parse::<JoinType>().map_err(MCPError::invalid_params)?,
        None => JoinType::default(),
    };
    let on = params.on.map(OneOrMany::into_vec).unwrap_or_default();
    let derived = service
        .join(&params.left_ref, &params.right_ref, on, how, params.name)
        .await?;
    to_result(derived)
}

pub async fn handle_sort(service: &Arc<DataService>, params: Value) -> Result<Value, MCPError> {
    let params: SortParams = parse_params(params)?;
    let keys = sort_keys(params.by.into_vec(), params.ascending)?;
    let derived = service.sort(&params.data_ref, keys, params.name).await?;
    to_result(derived)
}

pub async fn handle_head(service: &Arc<DataService>, params: Value) -> Result<Value, MCPError> {
    let params: WindowParams = parse_params(params)?;
    let derived = service.head(&params.data_ref, params.n, params.name).await?;
    to_result(derived)
}

pub async fn handle_tail(service: &Arc<DataService>, params: Value) -> Result<Value, MCPError> {
    let params: WindowParams = parse_params(params)?;
    let derived = service.tail(&params.data_ref, params.n, params.name).await?;
    to_result(derived)
}

pub async fn handle_describe(service: &Arc<DataService>, params: Value) -> Result<Value, MCPError> {
    let params: DescribeParams = parse_params(params)?;
    let derived = service.describe(&params.data_ref, params.name).await?;
    to_result(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_aggregations_keeps_order_and_aliases() {
        let agg = json!({"value": ["avg", "max"], "id": "count"});
        let Value::Object(map) = agg else { unreachable!() };
        let parsed = parse_aggregations(map).unwrap();
        assert_eq!(
            parsed,
            vec![
                Aggregation::new("value", vec![AggFunction::Mean, AggFunction::Max]),
                Aggregation::single("id", AggFunction::Count),
            ]
        );
    }

    #[test]
    fn test_parse_aggregations_rejects_unknown_function() {
        let Value::Object(map) = json!({"value": "mode"}) else { unreachable!() };
        let err = parse_aggregations(map).unwrap_err();
        assert!(err.message.contains("mode"));

        let Value::Object(map) = json!({"value": 3}) else { unreachable!() };
        assert!(parse_aggregations(map).is_err());
    }

    #[test]
    fn test_sort_keys() {
        let keys = sort_keys(vec!["a".into(), "b".into()], Some(OneOrMany::One(false))).unwrap();
        assert!(keys.iter().all(|k| !k.ascending));

        let keys = sort_keys(
            vec!["a".into(), "b".into()],
            Some(OneOrMany::Many(vec![true, false])),
        )
        .unwrap();
        assert_eq!(keys[1], SortKey::descending("b"));

        assert!(sort_keys(vec!["a".into()], Some(OneOrMany::Many(vec![true, false]))).is_err());
    }
}
