//! Remote sample manifest.
//!
//! The manifest lists hosted sample models by their description path
//! relative to the manifest base URL. Two shapes are accepted:
//!
//! ```text
//! {"samples": [{"name": "Arm", "path": "arm/urdf/arm.urdf.xacro"}, ...]}
//! ["arm/urdf/arm.urdf.xacro", "rover/rover.urdf"]
//! ```

use serde_json::Value;

use crate::diagnostic::LoadError;
use crate::path::{file_name, normalize};

/// One hosted sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleEntry {
    /// Display name. Falls back to the description's file name.
    pub name: String,
    /// Description path relative to the manifest base URL.
    pub path: String,
}

/// Parsed sample listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleManifest {
    entries: Vec<SampleEntry>,
}

impl SampleManifest {
    /// Parse a manifest document.
    ///
    /// ```
    /// use robot_assembly::resource::manifest::SampleManifest;
    ///
    /// let manifest = SampleManifest::from_json(r#"["rover/rover.urdf"]"#).unwrap();
    /// assert_eq!(manifest.entries()[0].name, "rover.urdf");
    /// ```
    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| LoadError::Manifest(format!("invalid manifest JSON: {e}")))?;

        let list = match &value {
            Value::Array(items) => items,
            Value::Object(map) => map
                .get("samples")
                .and_then(Value::as_array)
                .ok_or_else(|| LoadError::Manifest("missing `samples` array".into()))?,
            _ => return Err(LoadError::Manifest("manifest must be an object or array".into())),
        };

        let entries = list
            .iter()
            .enumerate()
            .map(|(i, item)| parse_entry(item).ok_or_else(|| LoadError::Manifest(format!("invalid sample entry #{i}"))))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("manifest lists {} sample(s)", entries.len());
        Ok(Self { entries })
    }

    /// Samples in listing order.
    pub fn entries(&self) -> &[SampleEntry] {
        &self.entries
    }

    /// Find a sample by display name.
    pub fn find(&self, name: &str) -> Option<&SampleEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the listing is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_entry(item: &Value) -> Option<SampleEntry> {
    let (name, path) = match item {
        Value::String(path) => (None, path.as_str()),
        Value::Object(map) => (
            map.get("name").and_then(Value::as_str),
            map.get("path").and_then(Value::as_str)?,
        ),
        _ => return None,
    };
    let path = normalize(path);
    if path.is_empty() {
        return None;
    }
    let name = name.map_or_else(|| file_name(&path).to_string(), str::to_string);
    Some(SampleEntry { name, path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_form() {
        let manifest = SampleManifest::from_json(
            r#"{"samples": [
                {"name": "Arm", "path": "arm/urdf/arm.urdf.xacro"},
                {"path": "./rover/rover.urdf"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.find("Arm").unwrap().path, "arm/urdf/arm.urdf.xacro");
        assert_eq!(manifest.entries()[1].name, "rover.urdf");
        assert_eq!(manifest.entries()[1].path, "rover/rover.urdf");
    }

    #[test]
    fn test_array_form() {
        let manifest = SampleManifest::from_json(r#"["a/a.urdf", "b/b.urdf"]"#).unwrap();
        let paths: Vec<_> = manifest.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["a/a.urdf", "b/b.urdf"]);
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            SampleManifest::from_json("not json"),
            Err(LoadError::Manifest(_))
        ));
        assert!(SampleManifest::from_json(r#"{"models": []}"#).is_err());
        assert!(SampleManifest::from_json(r#"[{"name": "no path"}]"#).is_err());
        assert!(SampleManifest::from_json("42").is_err());
    }
}
