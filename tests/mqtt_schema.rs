// Schema validation tests for MQTT wire format
//
// The status payload is built both by hand and from the library's stats
// type, then validated against the JSON Schema files in schemas/mqtt/.

use std::collections::VecDeque;

use fire_panel_bridge::{GatewayConfig, ProtocolManager, Publisher, Result};
use serde_json::json;

fn load_schema(name: &str) -> serde_json::Value {
    let path = format!("{}/schemas/mqtt/{name}", env!("CARGO_MANIFEST_DIR"));
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read schema {path}: {e}"));
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("Failed to parse schema {path}: {e}"))
}

fn build_validator(schema_name: &str) -> jsonschema::Validator {
    let schema = load_schema(schema_name);
    jsonschema::validator_for(&schema)
        .unwrap_or_else(|e| panic!("Failed to compile schema {schema_name}: {e}"))
}

fn validate(schema_name: &str, instance: &serde_json::Value) {
    let validator = build_validator(schema_name);
    let errors: Vec<_> = validator.iter_errors(instance).collect();
    if !errors.is_empty() {
        let msgs: Vec<String> = errors.iter().map(|e| format!("  - {e}")).collect();
        panic!(
            "Schema validation failed for {schema_name}:\n{}\nInstance: {}",
            msgs.join("\n"),
            serde_json::to_string_pretty(instance).unwrap()
        );
    }
}

fn validate_fails(schema_name: &str, instance: &serde_json::Value) {
    let validator = build_validator(schema_name);
    assert!(
        !validator.is_valid(instance),
        "Expected schema validation to fail for {schema_name}, but it passed.\nInstance: {}",
        serde_json::to_string_pretty(instance).unwrap()
    );
}

struct Discard;

impl Publisher for Discard {
    fn publish(&mut self, _topic: &str, _payload: &str) -> Result<()> {
        Ok(())
    }
}

fn status(protocol: serde_json::Value, stats: serde_json::Value) -> serde_json::Value {
    json!({
        "now": 1760800000000_u64,
        "op": "STATUS",
        "protocol": protocol,
        "stats": stats,
    })
}

fn advanced_protocol() -> serde_json::Value {
    json!({
        "id": 5,
        "label": "Advanced MXPro BMS I/F",
        "interface": "serial",
        "active": true
    })
}

// =========================================================================
// Status
// =========================================================================

#[test]
fn status_valid() {
    validate(
        "status.schema.json",
        &status(
            advanced_protocol(),
            json!({
                "totalEvents": 12,
                "eventsPublished": 11,
                "framesRejected": 2,
                "discardedBytes": 40,
                "transportFailures": 1,
                "lastTransferId": 12
            }),
        ),
    );
}

#[test]
fn status_valid_before_first_event() {
    validate(
        "status.schema.json",
        &status(
            json!({ "id": 0, "label": "None configured", "interface": "None", "active": false }),
            json!({
                "totalEvents": 0,
                "eventsPublished": 0,
                "framesRejected": 0,
                "discardedBytes": 0,
                "transportFailures": 0
            }),
        ),
    );
}

#[test]
fn status_from_library_stats() {
    let mut manager = ProtocolManager::new(GatewayConfig::builder().protocol_id(5).build());
    let mut input: VecDeque<u8> = fire_panel_bridge::crc::request_node_status()
        .into_iter()
        .chain([0xFE, 0x80, 0xFB])
        .collect();
    manager.scan(&mut input, &mut Discard);

    let stats = serde_json::to_value(manager.stats()).unwrap();
    assert_eq!(stats["totalEvents"], 1);
    assert_eq!(stats["framesRejected"], 1);
    validate("status.schema.json", &status(advanced_protocol(), stats));
}

#[test]
fn status_wrong_op_fails() {
    let mut instance = status(
        advanced_protocol(),
        json!({
            "totalEvents": 0,
            "eventsPublished": 0,
            "framesRejected": 0,
            "discardedBytes": 0,
            "transportFailures": 0
        }),
    );
    instance["op"] = json!("SNAPSHOT");
    validate_fails("status.schema.json", &instance);
}

#[test]
fn status_unknown_interface_fails() {
    validate_fails(
        "status.schema.json",
        &status(
            json!({ "id": 5, "label": "x", "interface": "RS485", "active": true }),
            json!({
                "totalEvents": 0,
                "eventsPublished": 0,
                "framesRejected": 0,
                "discardedBytes": 0,
                "transportFailures": 0
            }),
        ),
    );
}

#[test]
fn status_missing_stats_field_fails() {
    validate_fails(
        "status.schema.json",
        &status(
            advanced_protocol(),
            json!({ "totalEvents": 0, "eventsPublished": 0 }),
        ),
    );
}

#[test]
fn status_transfer_id_out_of_range_fails() {
    validate_fails(
        "status.schema.json",
        &status(
            advanced_protocol(),
            json!({
                "totalEvents": 300,
                "eventsPublished": 300,
                "framesRejected": 0,
                "discardedBytes": 0,
                "transportFailures": 0,
                "lastTransferId": 300
            }),
        ),
    );
}
