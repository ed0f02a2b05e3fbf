//! Wire types for the Penguin Statistics API
//!
//! This module defines the JSON shapes exchanged with the service:
//! - `Server` and `DropType`: closed enumerations used across endpoints
//! - `ItemDrop` and `DropReport`: what a user submits after clearing a stage
//! - `DropRecord`: one aggregated row of the drop matrix
//! - `Stage`: stage metadata
//! - Planner request/response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::PenguinError;

/// Game server region
///
/// The service keeps separate statistics per region. When a query does not
/// name one, the service documentation treats CN as the default.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Server {
    Us,
    #[default]
    Cn,
    Jp,
    Kr,
}

impl Server {
    /// Wire representation ("US", "CN", ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Server::Us => "US",
            Server::Cn => "CN",
            Server::Jp => "JP",
            Server::Kr => "KR",
        }
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Server {
    type Err = PenguinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "US" => Ok(Server::Us),
            "CN" => Ok(Server::Cn),
            "JP" => Ok(Server::Jp),
            "KR" => Ok(Server::Kr),
            other => Err(PenguinError::InvalidParameter(format!(
                "unknown server '{}', expected one of US, CN, JP, KR",
                other
            ))),
        }
    }
}

/// Kind of drop an item came from
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DropType {
    #[default]
    NormalDrop,
    SpecialDrop,
    ExtraDrop,
    #[serde(rename = "FURNITURE")]
    Furniture,
}

impl fmt::Display for DropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropType::NormalDrop => write!(f, "NORMAL_DROP"),
            DropType::SpecialDrop => write!(f, "SPECIAL_DROP"),
            DropType::ExtraDrop => write!(f, "EXTRA_DROP"),
            DropType::Furniture => write!(f, "FURNITURE"),
        }
    }
}

impl FromStr for DropType {
    type Err = PenguinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NORMAL_DROP" | "NORMAL" => Ok(DropType::NormalDrop),
            "SPECIAL_DROP" | "SPECIAL" => Ok(DropType::SpecialDrop),
            "EXTRA_DROP" | "EXTRA" => Ok(DropType::ExtraDrop),
            "FURNITURE" => Ok(DropType::Furniture),
            other => Err(PenguinError::InvalidParameter(format!(
                "unknown drop type '{}'",
                other
            ))),
        }
    }
}

/// One item obtained at the end of a stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ItemDrop {
    pub drop_type: DropType,
    pub item_id: String,
    pub quantity: i64,
}

impl ItemDrop {
    /// Create a normal drop
    pub fn new(item_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            drop_type: DropType::NormalDrop,
            item_id: item_id.into(),
            quantity,
        }
    }

    /// Builder method: set drop type
    pub fn drop_type(mut self, drop_type: DropType) -> Self {
        self.drop_type = drop_type;
        self
    }
}

/// A single user-submitted drop observation
///
/// `source` identifies the reporting tool and is also sent as the
/// `User-Agent` header; `version` is the version of that tool.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DropReport {
    pub server: Server,
    pub stage_id: String,
    pub drops: Vec<ItemDrop>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl DropReport {
    /// Create an empty report for a stage
    pub fn new(server: Server, stage_id: impl Into<String>) -> Self {
        Self {
            server,
            stage_id: stage_id.into(),
            drops: Vec::new(),
            source: None,
            version: None,
        }
    }

    /// Builder method: add a drop
    pub fn item(mut self, drop: ItemDrop) -> Self {
        self.drops.push(drop);
        self
    }

    /// Builder method: add multiple drops
    pub fn items(mut self, drops: impl IntoIterator<Item = ItemDrop>) -> Self {
        self.drops.extend(drops);
        self
    }

    /// Builder method: set reporting source
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Builder method: set source version
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// One row of the drop matrix
///
/// `quantity` items were observed over `times` clears of `stage_id`
/// between `start` and `end`. The service sends timestamps as epoch
/// milliseconds; `end` is null while the window is still open. Values are
/// taken as received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DropRecord {
    pub stage_id: String,
    pub item_id: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub times: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub end: Option<DateTime<Utc>>,
}

impl DropRecord {
    /// Observed drops per clear, `None` when there are no clears
    pub fn drop_rate(&self) -> Option<f64> {
        if self.times == 0 {
            None
        } else {
            Some(self.quantity as f64 / self.times as f64)
        }
    }

    /// Whether the observation window is still open
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// Stage metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub stage_id: String,
    #[serde(default)]
    pub zone_id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub stage_type: String,
    #[serde(default)]
    pub ap_cost: Option<i64>,
    /// Minimum clear time in milliseconds
    #[serde(default)]
    pub min_clear_time: Option<u64>,
    #[serde(default)]
    pub drop_infos: Vec<DropInfo>,
}

/// What a stage can drop and in what quantities
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DropInfo {
    #[serde(default)]
    pub item_id: Option<String>,
    pub drop_type: DropType,
    #[serde(default)]
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub lower: i64,
    pub upper: i64,
    #[serde(default)]
    pub exceptions: Vec<i64>,
}

// ============================================
// Planner
// ============================================

/// Request body for the farming planner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannerRequest {
    /// Items already owned, by item name or id
    #[serde(default)]
    pub owned: HashMap<String, i64>,
    /// Items wanted, by item name or id
    pub required: HashMap<String, i64>,
    /// Consider byproducts of crafting
    #[serde(default)]
    pub extra_outc: bool,
    /// Value battle record (EXP) drops
    #[serde(default)]
    pub exp_demand: bool,
    /// Value LMD drops
    #[serde(default = "default_gold_demand")]
    pub gold_demand: bool,
    /// Stage codes to leave out of the plan
    #[serde(default)]
    pub exclude: Vec<String>,
    pub server: Server,
    #[serde(default = "default_lang")]
    pub input_lang: String,
    #[serde(default = "default_lang")]
    pub output_lang: String,
    /// Include item values in the response
    #[serde(default)]
    pub store: bool,
}

fn default_lang() -> String {
    "id".to_string()
}

fn default_gold_demand() -> bool {
    true
}

impl PlannerRequest {
    pub fn new(server: Server) -> Self {
        Self {
            owned: HashMap::new(),
            required: HashMap::new(),
            extra_outc: false,
            exp_demand: false,
            gold_demand: default_gold_demand(),
            exclude: Vec::new(),
            server,
            input_lang: default_lang(),
            output_lang: default_lang(),
            store: false,
        }
    }

    /// Builder method: require a quantity of an item
    pub fn require(mut self, item: impl Into<String>, quantity: i64) -> Self {
        self.required.insert(item.into(), quantity);
        self
    }

    /// Builder method: record an owned quantity of an item
    pub fn own(mut self, item: impl Into<String>, quantity: i64) -> Self {
        self.owned.insert(item.into(), quantity);
        self
    }

    /// Builder method: exclude a stage
    pub fn exclude(mut self, stage: impl Into<String>) -> Self {
        self.exclude.push(stage.into());
        self
    }
}

/// Planner response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannerPlan {
    /// Total sanity cost
    #[serde(default, deserialize_with = "number_or_string")]
    pub cost: f64,
    /// Total LMD spent on crafting
    #[serde(default, deserialize_with = "number_or_string")]
    pub gcost: f64,
    /// Total LMD gained
    #[serde(default, deserialize_with = "number_or_string")]
    pub gold: f64,
    /// Total EXP gained
    #[serde(default, deserialize_with = "number_or_string")]
    pub exp: f64,
    #[serde(default)]
    pub stages: Vec<PlannedStage>,
    #[serde(default)]
    pub syntheses: Vec<Synthesis>,
    #[serde(default)]
    pub values: Vec<ItemValueGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedStage {
    pub stage: String,
    /// Number of clears
    #[serde(deserialize_with = "number_or_string")]
    pub count: f64,
    /// Expected item yield over all clears
    #[serde(default)]
    pub items: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Synthesis {
    pub target: String,
    #[serde(deserialize_with = "number_or_string")]
    pub count: f64,
    #[serde(default)]
    pub materials: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemValueGroup {
    pub level: String,
    #[serde(default)]
    pub items: Vec<ItemValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemValue {
    pub name: String,
    #[serde(deserialize_with = "number_or_string")]
    pub value: f64,
}

/// The planner sends some numbers as JSON strings ("12.5")
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_wire_format() {
        assert_eq!(serde_json::to_string(&Server::Cn).unwrap(), "\"CN\"");
        assert_eq!(serde_json::to_string(&Server::Us).unwrap(), "\"US\"");
        let kr: Server = serde_json::from_str("\"KR\"").unwrap();
        assert_eq!(kr, Server::Kr);
        assert_eq!(Server::default(), Server::Cn);
    }

    #[test]
    fn test_server_from_str() {
        assert_eq!("jp".parse::<Server>().unwrap(), Server::Jp);
        assert_eq!(" US ".parse::<Server>().unwrap(), Server::Us);
        assert!("EU".parse::<Server>().is_err());
    }

    #[test]
    fn test_drop_type_wire_format() {
        assert_eq!(
            serde_json::to_string(&DropType::SpecialDrop).unwrap(),
            "\"SPECIAL_DROP\""
        );
        assert_eq!(
            serde_json::to_string(&DropType::Furniture).unwrap(),
            "\"FURNITURE\""
        );
        assert_eq!("extra".parse::<DropType>().unwrap(), DropType::ExtraDrop);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = DropReport::new(Server::Us, "main_01-07")
            .item(ItemDrop::new("30012", 2))
            .item(ItemDrop::new("furni_1", 1).drop_type(DropType::Furniture));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["server"], "US");
        assert_eq!(json["stageId"], "main_01-07");
        assert_eq!(json["drops"][0]["itemId"], "30012");
        assert_eq!(json["drops"][0]["dropType"], "NORMAL_DROP");
        assert_eq!(json["drops"][1]["dropType"], "FURNITURE");
        assert!(json.get("source").is_none());
        assert!(json.get("version").is_none());
    }

    #[test]
    fn test_report_includes_source_when_set() {
        let report = DropReport::new(Server::Cn, "main_04-04")
            .source("my-tool")
            .version("1.2.0");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["source"], "my-tool");
        assert_eq!(json["version"], "1.2.0");
    }

    #[test]
    fn test_drop_record_parses_epoch_millis() {
        let json = r#"{
            "stageId": "main_01-07",
            "itemId": "30012",
            "quantity": 150,
            "times": 100,
            "start": 1556676000000,
            "end": null
        }"#;
        let record: DropRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.stage_id, "main_01-07");
        assert_eq!(record.start.timestamp_millis(), 1556676000000);
        assert!(record.is_open());
        assert_eq!(record.drop_rate(), Some(1.5));
    }

    #[test]
    fn test_drop_record_missing_end_and_zero_times() {
        let json = r#"{"stageId":"a","itemId":"b","quantity":0,"times":0,"start":0}"#;
        let record: DropRecord = serde_json::from_str(json).unwrap();
        assert!(record.end.is_none());
        assert_eq!(record.drop_rate(), None);
    }

    #[test]
    fn test_drop_record_accepts_negative_quantity() {
        let json = r#"{"stageId":"a","itemId":"b","quantity":-3,"times":4,"start":0,"end":1000}"#;
        let record: DropRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.quantity, -3);
        assert_eq!(record.end.map(|e| e.timestamp_millis()), Some(1000));
    }

    #[test]
    fn test_stage_tolerates_sparse_payload() {
        let json = r#"{
            "stageId": "main_01-07",
            "zoneId": "main_1",
            "code": "1-7",
            "apCost": 6,
            "dropInfos": [
                {"itemId": "30012", "dropType": "NORMAL_DROP", "bounds": {"lower": 0, "upper": 3}},
                {"dropType": "EXTRA_DROP", "bounds": {"lower": 0, "upper": 1, "exceptions": [2]}}
            ],
            "existence": {"US": {"exist": true}}
        }"#;
        let stage: Stage = serde_json::from_str(json).unwrap();
        assert_eq!(stage.code, "1-7");
        assert_eq!(stage.ap_cost, Some(6));
        assert_eq!(stage.min_clear_time, None);
        assert_eq!(stage.drop_infos.len(), 2);
        assert_eq!(stage.drop_infos[1].item_id, None);
        assert_eq!(stage.drop_infos[1].bounds.as_ref().unwrap().exceptions, vec![2]);
    }

    #[test]
    fn test_planner_plan_accepts_string_numbers() {
        let json = r#"{
            "cost": 1234,
            "gcost": "5000",
            "gold": "36000",
            "exp": 1200.5,
            "stages": [{"stage": "1-7", "count": "205.3", "items": {"Orirock Cube": "220"}}],
            "syntheses": [{"target": "Orirock Cluster", "count": "10", "materials": {"Orirock Cube": "50"}}],
            "values": [{"level": "1", "items": [{"name": "Orirock", "value": "1.0"}]}]
        }"#;
        let plan: PlannerPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.cost, 1234.0);
        assert_eq!(plan.gcost, 5000.0);
        assert_eq!(plan.stages[0].count, 205.3);
        assert_eq!(plan.syntheses[0].count, 10.0);
        assert_eq!(plan.values[0].items[0].value, 1.0);
    }

    #[test]
    fn test_planner_request_defaults() {
        let req = PlannerRequest::new(Server::Jp)
            .require("30012", 10)
            .own("30011", 4)
            .exclude("main_01-07");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["server"], "JP");
        assert_eq!(json["required"]["30012"], 10);
        assert_eq!(json["owned"]["30011"], 4);
        assert_eq!(json["gold_demand"], true);
        assert_eq!(json["input_lang"], "id");
        assert_eq!(json["exclude"][0], "main_01-07");
    }

    #[test]
    fn test_planner_request_file_matches_builder() {
        let req: PlannerRequest = serde_json::from_str(r#"{"required":{},"server":"CN"}"#).unwrap();
        assert!(req.gold_demand);
        assert_eq!(req, PlannerRequest::new(Server::Cn));

        let req: PlannerRequest =
            serde_json::from_str(r#"{"required":{},"server":"CN","gold_demand":false}"#).unwrap();
        assert!(!req.gold_demand);
    }
}
