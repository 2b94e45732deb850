use serde_json::Value;

/// Headline figure for each calculator, checked in order.
const PRIORITY_KEYS: [&str; 10] = [
    "scheduled_payment",
    "total_monthly_payment",
    "noi",
    "irr_pct",
    "penalty",
    "total_interest",
    "npv_diff",
    "monthly_savings",
    "total_financing_cost",
    "dscr",
];

/// Print just the key answer value from the output, falling back to the
/// first field of the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key) {
                if !val.is_null() {
                    return format_minimal(val);
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    format_minimal(result_obj)
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_priority_key_wins() {
        let value = json!({"result": {"total_paid": "1", "scheduled_payment": "599.55"}});
        assert_eq!(minimal_line(&value), "599.55");
    }

    #[test]
    fn test_fallback_to_first_field() {
        let value = json!({"result": {"loan_amount": "400000"}});
        assert_eq!(minimal_line(&value), "loan_amount: 400000");
    }
}
