//! Metric function descriptors such as `MOVING_AVERAGE_7_DAYS(AGGREGATE_1_HOURS(m1,m2))`.
//!
//! Every function token ends in `{size}_{unit}`; whatever is left after the
//! last `(` is the comma-separated metric list.

use serde::Serialize;
use std::fmt;

use crate::duration::{to_millis, DurationUnit};
use crate::error::{DashError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionCall {
    pub name: String,
    pub size: i64,
    pub unit: String,
}

impl FunctionCall {
    pub fn duration_unit(&self) -> Option<DurationUnit> {
        self.unit.parse().ok()
    }

    /// Window covered by one application of the function, if the unit is known.
    pub fn window_millis(&self) -> Option<i64> {
        to_millis(self.size, &self.unit)
    }
}

/// Function calls are ordered outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricFunction {
    pub functions: Vec<FunctionCall>,
    pub metrics: Vec<String>,
}

impl fmt::Display for MetricFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for call in &self.functions {
            if call.name.is_empty() {
                write!(f, "{}_{}(", call.size, call.unit)?;
            } else {
                write!(f, "{}_{}_{}(", call.name, call.size, call.unit)?;
            }
        }
        f.write_str(&self.metrics.join(","))?;
        for _ in &self.functions {
            f.write_str(")")?;
        }
        Ok(())
    }
}

fn parse_function_token(token: &str) -> Result<FunctionCall> {
    let parts: Vec<&str> = token.split('_').collect();
    if parts.len() < 2 {
        return Err(DashError::MalformedFunctionToken {
            token: token.to_string(),
            reason: "expected a {size}_{unit} suffix".to_string(),
        });
    }
    let unit = parts[parts.len() - 1];
    let size_token = parts[parts.len() - 2];
    let size = size_token
        .parse::<i64>()
        .map_err(|e| DashError::MalformedFunctionToken {
            token: token.to_string(),
            reason: format!("size {:?}: {}", size_token, e),
        })?;

    Ok(FunctionCall {
        name: parts[..parts.len() - 2].join("_"),
        size,
        unit: unit.to_string(),
    })
}

pub fn parse_metric_function(raw: &str) -> Result<MetricFunction> {
    let mut functions = Vec::new();
    let mut buffer = String::new();

    for ch in raw.chars() {
        match ch {
            '(' => {
                functions.push(parse_function_token(&buffer)?);
                buffer.clear();
            }
            ')' => {}
            _ => buffer.push(ch),
        }
    }

    Ok(MetricFunction {
        functions,
        metrics: buffer.split(',').map(str::to_string).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_function() {
        let parsed = parse_metric_function("foo_5_HOURS(a,b)").unwrap();
        assert_eq!(
            parsed.functions,
            vec![FunctionCall {
                name: "foo".to_string(),
                size: 5,
                unit: "HOURS".to_string()
            }]
        );
        assert_eq!(parsed.metrics, vec!["a", "b"]);
    }

    #[test]
    fn test_nested_functions_keep_underscored_names() {
        let raw = "MOVING_AVERAGE_7_DAYS(AGGREGATE_1_HOURS(m1,m2))";
        let parsed = parse_metric_function(raw).unwrap();
        assert_eq!(parsed.functions.len(), 2);
        assert_eq!(parsed.functions[0].name, "MOVING_AVERAGE");
        assert_eq!(parsed.functions[0].size, 7);
        assert_eq!(parsed.functions[0].unit, "DAYS");
        assert_eq!(parsed.functions[1].name, "AGGREGATE");
        assert_eq!(parsed.metrics, vec!["m1", "m2"]);
        assert_eq!(parsed.to_string(), raw);
    }

    #[test]
    fn test_bare_metrics() {
        let parsed = parse_metric_function("m1,m2").unwrap();
        assert!(parsed.functions.is_empty());
        assert_eq!(parsed.metrics, vec!["m1", "m2"]);
    }

    #[test]
    fn test_unparsable_size() {
        let err = parse_metric_function("foo_x_HOURS(a)").unwrap_err();
        assert!(matches!(err, DashError::MalformedFunctionToken { ref token, .. } if token == "foo_x_HOURS"));
        assert!(parse_metric_function("AGGREGATE(a)").is_err());
    }

    #[test]
    fn test_window_millis() {
        let parsed = parse_metric_function("AGGREGATE_1_HOURS(a)").unwrap();
        assert_eq!(parsed.functions[0].window_millis(), Some(3_600_000));
        assert_eq!(parsed.functions[0].duration_unit(), Some(DurationUnit::Hours));

        let parsed = parse_metric_function("AGGREGATE_1_FORTNIGHTS(a)").unwrap();
        assert_eq!(parsed.functions[0].window_millis(), None);
    }
}
