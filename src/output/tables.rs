use anyhow::Result;
use bkpipe::PipelineState;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn value_cell(value: &Value) -> Cell {
    match value {
        Value::Bool(true) => Cell::new("true").fg(TableColor::Green),
        Value::Bool(false) => Cell::new("false").fg(TableColor::Red),
        Value::String(s) if s.is_empty() => Cell::new("-").fg(TableColor::DarkGrey),
        Value::String(s) => Cell::new(s),
        Value::Null => Cell::new("(not observed)").fg(TableColor::Yellow),
        other => Cell::new(other.to_string()),
    }
}

fn add_section(table: &mut Table, title: &str, fields: &impl Serialize) -> Result<()> {
    match serde_json::to_value(fields)? {
        Value::Object(map) => {
            for (field, value) in &map {
                table.add_row(vec![Cell::new(title), Cell::new(field), value_cell(value)]);
            }
        }
        other => {
            table.add_row(vec![Cell::new(title), Cell::new(""), value_cell(&other)]);
        }
    }
    Ok(())
}

/// One row per field, grouped by which API owns it.
pub fn state_table(state: &PipelineState) -> Result<Table> {
    let mut table = create_table();
    table.set_header(vec!["Source", "Field", "Value"]);

    for (field, value) in [
        ("id", &state.id),
        ("slug", &state.slug),
        ("uuid", &state.uuid),
        ("webhook_url", &state.webhook_url),
    ] {
        let value = value.clone().map_or(Value::Null, Value::String);
        table.add_row(vec![Cell::new("identity"), Cell::new(field), value_cell(&value)]);
    }

    add_section(&mut table, "graphql", &state.pipeline)?;
    add_section(&mut table, "rest", &state.provider)?;

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bkpipe::{PipelineFields, ProviderFields};

    #[test]
    fn test_partial_state_table() {
        let state = PipelineState {
            id: Some("UGlwZWxpbmUtLS0x".to_string()),
            slug: Some("api".to_string()),
            pipeline: Some(PipelineFields {
                name: "api".to_string(),
                ..PipelineFields::default()
            }),
            ..PipelineState::default()
        };

        let rendered = state_table(&state).unwrap().to_string();
        assert!(rendered.contains("UGlwZWxpbmUtLS0x"));
        assert!(rendered.contains("skip_intermediate_builds"));
        assert!(rendered.contains("(not observed)"));
        assert!(!rendered.contains("trigger_mode"));
    }

    #[test]
    fn test_complete_state_table() {
        let state = PipelineState {
            pipeline: Some(PipelineFields::default()),
            provider: Some(ProviderFields::default()),
            ..PipelineState::with_id("UGlwZWxpbmUtLS0x")
        };

        let rendered = state_table(&state).unwrap().to_string();
        assert!(rendered.contains("trigger_mode"));
        assert!(rendered.contains("code"));
    }
}
