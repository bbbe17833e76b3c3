//! External settings: visibility mappings, material collections, environment
//!
//! Settings are fetched once from a [`SettingsSource`] and held in
//! [`MappingTables`] for the session. Fetching never fails: missing or
//! malformed documents resolve to empty tables and default environment.

mod environment;
mod tables;

pub use environment::EnvironmentSettings;
pub use tables::{
    MaterialVariant, MaterialVariantCollection, VariantAppearance, VisibilityMapping,
};

use crate::error::SettingsError;
use crate::model::BaseModelId;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Settings-type discriminator of the external store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SettingsKind {
    Groups,
    Materials,
    Environment,
}

impl SettingsKind {
    pub const ALL: [SettingsKind; 3] = [
        SettingsKind::Groups,
        SettingsKind::Materials,
        SettingsKind::Environment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingsKind::Groups => "groups",
            SettingsKind::Materials => "materials",
            SettingsKind::Environment => "environment",
        }
    }

    /// Key wrapping the payload inside a settings document
    fn payload_key(self) -> &'static str {
        match self {
            SettingsKind::Groups | SettingsKind::Materials => "mappings",
            SettingsKind::Environment => "environment",
        }
    }
}

/// Where settings documents come from
pub trait SettingsSource {
    /// Fetch the raw document for `kind`, `None` when the store has none
    fn fetch(&self, kind: SettingsKind) -> Result<Option<Value>, SettingsError>;
}

/// Settings read from `<dir>/<kind>.json`
#[derive(Clone, Debug)]
pub struct JsonDirSettings {
    dir: PathBuf,
}

impl JsonDirSettings {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, kind: SettingsKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.as_str()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SettingsSource for JsonDirSettings {
    fn fetch(&self, kind: SettingsKind) -> Result<Option<Value>, SettingsError> {
        let path = self.path_for(kind);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }
}

/// In-memory settings
#[derive(Clone, Debug, Default)]
pub struct StaticSettings {
    documents: FxHashMap<SettingsKind, Value>,
}

impl StaticSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: SettingsKind, document: Value) -> Self {
        self.documents.insert(kind, document);
        self
    }
}

impl SettingsSource for StaticSettings {
    fn fetch(&self, kind: SettingsKind) -> Result<Option<Value>, SettingsError> {
        Ok(self.documents.get(&kind).cloned())
    }
}

/// Rows of a list document: `{ "mappings": [...] }` or a bare array
fn payload_rows(kind: SettingsKind, document: Option<Value>) -> Vec<Value> {
    match document {
        Some(Value::Array(rows)) => rows,
        Some(Value::Object(mut object)) => match object.remove(kind.payload_key()) {
            Some(Value::Array(rows)) => rows,
            Some(_) => {
                tracing::warn!(kind = kind.as_str(), "settings payload is not a list");
                Vec::new()
            }
            None => Vec::new(),
        },
        Some(Value::Null) | None => Vec::new(),
        Some(_) => {
            tracing::warn!(kind = kind.as_str(), "unexpected settings document shape");
            Vec::new()
        }
    }
}

/// Object of the environment document: `{ "environment": {...} }` or bare
fn payload_object(document: Option<Value>) -> Map<String, Value> {
    match document {
        Some(Value::Object(mut object)) => match object.remove("environment") {
            Some(Value::Object(inner)) => inner,
            Some(_) => {
                tracing::warn!("environment payload is not an object");
                Map::new()
            }
            None => object,
        },
        _ => Map::new(),
    }
}

/// Fetched settings plus in-session overrides
#[derive(Clone, Debug, Default)]
pub struct MappingTables {
    groups: FxHashMap<(String, BaseModelId), VisibilityMapping>,
    overrides: FxHashMap<(String, BaseModelId), VisibilityMapping>,
    collections: Vec<MaterialVariantCollection>,
    environment: EnvironmentSettings,
}

impl MappingTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch every settings kind from `source`
    ///
    /// A failing or malformed document leaves that part empty.
    pub fn fetch(source: &dyn SettingsSource) -> Self {
        let fetch = |kind: SettingsKind| match source.fetch(kind) {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(kind = kind.as_str(), %err, "settings fetch failed");
                None
            }
        };

        let groups = tables::parse_group_rows(&payload_rows(
            SettingsKind::Groups,
            fetch(SettingsKind::Groups),
        ));
        let collections = tables::parse_material_rows(&payload_rows(
            SettingsKind::Materials,
            fetch(SettingsKind::Materials),
        ));
        let environment = EnvironmentSettings::merged(&payload_object(fetch(SettingsKind::Environment)));

        tracing::info!(
            groups = groups.len(),
            collections = collections.len(),
            "settings loaded"
        );

        let mut out = Self {
            collections,
            environment,
            ..Default::default()
        };
        for mapping in groups {
            out.insert_group(mapping);
        }
        out
    }

    /// Add or replace a fetched group mapping
    pub fn insert_group(&mut self, mapping: VisibilityMapping) {
        self.groups
            .insert((mapping.group_name.clone(), mapping.base), mapping);
    }

    pub fn insert_collection(&mut self, collection: MaterialVariantCollection) {
        self.collections.retain(|c| c.id != collection.id);
        self.collections.push(collection);
    }

    pub fn set_environment(&mut self, environment: EnvironmentSettings) {
        self.environment = environment;
    }

    /// Layer a session-only mapping over the fetched one
    pub fn set_group_override(&mut self, mapping: VisibilityMapping) {
        self.overrides
            .insert((mapping.group_name.clone(), mapping.base), mapping);
    }

    pub fn clear_group_override(&mut self, group_name: &str, base: BaseModelId) -> bool {
        self.overrides
            .remove(&(group_name.to_string(), base))
            .is_some()
    }

    pub fn clear_overrides(&mut self) {
        self.overrides.clear();
    }

    /// Effective mapping for a node name on a hull, overrides first
    pub fn visibility_mapping(&self, group_name: &str, base: BaseModelId) -> Option<&VisibilityMapping> {
        let key = (group_name.to_string(), base);
        self.overrides.get(&key).or_else(|| self.groups.get(&key))
    }

    pub fn collections(&self) -> &[MaterialVariantCollection] {
        &self.collections
    }

    pub fn collection(&self, id: &str) -> Option<&MaterialVariantCollection> {
        self.collections.iter().find(|c| c.id == id)
    }

    /// Collection governing a hull slot
    pub fn collection_for_slot(&self, slot: &str) -> Option<&MaterialVariantCollection> {
        self.collections.iter().find(|c| c.governs(slot))
    }

    pub fn environment(&self) -> &EnvironmentSettings {
        &self.environment
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::Color;
    use serde_json::json;

    fn source() -> StaticSettings {
        StaticSettings::new()
            .with(
                SettingsKind::Groups,
                json!({ "mappings": [
                    { "groupName": "Bimini", "modelId": "lagoon", "hiddenByDefault": true, "linkedOptionId": "bimini" },
                    { "groupName": "Ladder", "modelId": "tide-electric", "hiddenByDefault": true }
                ]}),
            )
            .with(
                SettingsKind::Materials,
                json!([{ "materialName": "Hull_Top", "variants": [{ "name": "grey", "hex": "#707070" }] }]),
            )
            .with(SettingsKind::Environment, json!({ "environment": { "waterRadius": 12.0 } }))
    }

    #[test]
    fn test_fetch_all_kinds() {
        let tables = MappingTables::fetch(&source());
        assert_eq!(tables.group_count(), 2);
        assert!(tables.visibility_mapping("Bimini", BaseModelId::Lagoon).is_some());
        assert!(tables.visibility_mapping("Ladder", BaseModelId::Tide).is_some());
        assert!(tables.visibility_mapping("Bimini", BaseModelId::Tide).is_none());
        let hull = tables.collection_for_slot("Hull_Top").unwrap();
        assert_eq!(
            hull.variant("grey").map(|v| &v.appearance),
            Some(&VariantAppearance::Color {
                color: Color::from_hex(0x707070),
                metalness: None,
                roughness: None
            })
        );
        assert_eq!(tables.environment().water_radius, 12.0);
    }

    #[test]
    fn test_missing_and_malformed_documents() {
        let source = StaticSettings::new()
            .with(SettingsKind::Groups, json!({ "rows": [] }))
            .with(SettingsKind::Materials, json!({ "mappings": "nope" }))
            .with(SettingsKind::Environment, json!(42));
        let tables = MappingTables::fetch(&source);
        assert_eq!(tables.group_count(), 0);
        assert!(tables.collections().is_empty());
        assert_eq!(tables.environment(), &EnvironmentSettings::default());
    }

    #[test]
    fn test_override_wins_and_clears() {
        let mut tables = MappingTables::fetch(&source());
        tables.set_group_override(VisibilityMapping::new("Bimini", BaseModelId::Lagoon));
        assert!(!tables.visibility_mapping("Bimini", BaseModelId::Lagoon).unwrap().hidden_by_default);
        assert!(tables.clear_group_override("Bimini", BaseModelId::Lagoon));
        assert!(tables.visibility_mapping("Bimini", BaseModelId::Lagoon).unwrap().hidden_by_default);
    }

    #[test]
    fn test_json_dir_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("groups.json"),
            r#"[{ "groupName": "Rails", "modelId": "lagoon", "hiddenByDefault": true }]"#,
        )
        .unwrap();
        let source = JsonDirSettings::new(dir.path());
        assert!(source.fetch(SettingsKind::Materials).unwrap().is_none());
        let tables = MappingTables::fetch(&source);
        assert_eq!(tables.group_count(), 1);
    }

    #[test]
    fn test_json_dir_bad_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("environment.json"), "{ nope").unwrap();
        let source = JsonDirSettings::new(dir.path());
        assert!(matches!(
            source.fetch(SettingsKind::Environment),
            Err(SettingsError::Json(_))
        ));
        assert_eq!(MappingTables::fetch(&source).environment(), &EnvironmentSettings::default());
    }
}
