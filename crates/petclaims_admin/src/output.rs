//! Text and JSON rendering of operation results.

use serde::Serialize;

use crate::operation::AdminOutput;

#[derive(Serialize)]
struct Response<'a> {
    success: bool,
    operation: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a serde_json::Value>,
}

pub fn render_text(output: &AdminOutput) -> String {
    let mut text = output.summary.clone();
    for line in &output.details {
        text.push('\n');
        text.push_str(line);
    }
    text
}

pub fn render_json(operation: &str, result: &Result<AdminOutput, anyhow::Error>) -> String {
    let response = match result {
        Ok(output) => Response {
            success: true,
            operation,
            message: Some(output.summary.clone()),
            data: Some(&output.data).filter(|d| !d.is_null()),
        },
        Err(e) => Response {
            success: false,
            operation,
            message: Some(format!("{:#}", e)),
            data: None,
        },
    };
    serde_json::to_string_pretty(&response).unwrap_or_else(|e| {
        format!(
            "{{\"success\":false,\"operation\":\"{}\",\"message\":\"encoding failed: {}\"}}",
            operation, e
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_text_joins_summary_and_details() {
        let out = AdminOutput::new("done").line("a").line("b");
        assert_eq!(render_text(&out), "done\na\nb");
    }

    #[test]
    fn test_json_success_and_failure() {
        let ok = Ok(AdminOutput::new("2 rows")
            .with_data(&serde_json::json!({ "rows": 2 }))
            .unwrap());
        let json: Value = serde_json::from_str(&render_json("find-null-fields", &ok)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["rows"], 2);

        let err = Err(anyhow::anyhow!("No profile with email x@y.z"));
        let json: Value = serde_json::from_str(&render_json("inspect-user", &err)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["operation"], "inspect-user");
        assert_eq!(json["message"], "No profile with email x@y.z");
        assert!(json.get("data").is_none());
    }
}
