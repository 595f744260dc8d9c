//! Layout document (de)serialization.
//!
//! The persisted shape is `{ "widgets": [...], "nextZIndex": n }` with
//! camelCase widget records. Unknown widget types are preserved opaquely so
//! forward-compatible property sets survive a load/save cycle. Transient
//! selection flags are never written.

use std::collections::HashSet;

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::scene::Scene;
use crate::widget::{GroupData, Widget, WidgetId, WidgetKind};

/// Properties key carrying a group's ordered child ids.
const CHILD_IDS_KEY: &str = "childIds";
/// Properties key carrying the z-indices captured at group creation.
const CHILD_Z_KEY: &str = "childZIndices";

/// Document load/save errors. A failed load leaves the caller's previous
/// scene untouched.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed layout document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate widget id: {0}")]
    DuplicateId(WidgetId),
    #[error("group {0} has a missing or malformed childIds list")]
    MalformedChildIds(WidgetId),
}

/// One persisted widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetRecord {
    pub id: WidgetId,
    pub position: Point,
    pub size: Size,
    pub z_index: i64,
    #[serde(rename = "type")]
    pub widget_type: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl From<&Widget> for WidgetRecord {
    fn from(widget: &Widget) -> Self {
        let mut properties = widget.properties.clone();
        if let WidgetKind::Group(data) = &widget.kind {
            properties.insert(
                CHILD_IDS_KEY.to_string(),
                Value::Array(data.child_ids.iter().cloned().map(Value::String).collect()),
            );
            properties.insert(
                CHILD_Z_KEY.to_string(),
                Value::Array(data.child_z.iter().map(|z| Value::from(*z)).collect()),
            );
        }
        Self {
            id: widget.id.clone(),
            position: widget.position,
            size: widget.size,
            z_index: widget.z_index,
            widget_type: widget.kind.type_tag().to_string(),
            properties,
        }
    }
}

impl WidgetRecord {
    fn into_widget(mut self) -> Result<Widget, DocumentError> {
        let kind = match self.widget_type.as_str() {
            "box" => WidgetKind::Box,
            "text" => WidgetKind::Text,
            "qr" => WidgetKind::Qr,
            "group" => {
                let child_ids = match self.properties.remove(CHILD_IDS_KEY) {
                    Some(Value::Array(values)) => values
                        .into_iter()
                        .map(|value| match value {
                            Value::String(id) => Ok(id),
                            _ => Err(DocumentError::MalformedChildIds(self.id.clone())),
                        })
                        .collect::<Result<Vec<WidgetId>, _>>()?,
                    _ => return Err(DocumentError::MalformedChildIds(self.id.clone())),
                };
                // Older documents may lack the captured z list; ungroup
                // then falls back to the children's current z-indices.
                let child_z = match self.properties.remove(CHILD_Z_KEY) {
                    Some(Value::Array(values)) => {
                        values.iter().filter_map(Value::as_i64).collect()
                    }
                    _ => Vec::new(),
                };
                WidgetKind::Group(GroupData { child_ids, child_z })
            }
            _ => WidgetKind::Other(self.widget_type.clone()),
        };
        Ok(Widget {
            id: self.id,
            position: self.position,
            size: self.size,
            z_index: self.z_index,
            kind,
            properties: self.properties,
        })
    }
}

/// The serialized scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDocument {
    pub widgets: Vec<WidgetRecord>,
    pub next_z_index: i64,
}

impl LayoutDocument {
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Snapshot a scene's persisted fields, in insertion order.
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            widgets: scene.widgets().map(WidgetRecord::from).collect(),
            next_z_index: scene.next_z_index(),
        }
    }

    /// Validate and build the scene this document describes.
    pub fn into_scene(self) -> Result<Scene, DocumentError> {
        let mut seen: HashSet<WidgetId> = HashSet::with_capacity(self.widgets.len());
        let mut widgets = Vec::with_capacity(self.widgets.len());
        for record in self.widgets {
            if !seen.insert(record.id.clone()) {
                return Err(DocumentError::DuplicateId(record.id));
            }
            widgets.push(record.into_widget()?);
        }
        // Dangling child references are tolerated but worth surfacing.
        for widget in &widgets {
            if let Some(group) = widget.as_group() {
                for child in &group.child_ids {
                    if !seen.contains(child) {
                        log::warn!(
                            "document: group {} references missing child {child}",
                            widget.id
                        );
                    }
                }
            }
        }
        Ok(Scene::from_parts(widgets, self.next_z_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(id: &str, x: f64, y: f64, w: f64, h: f64) -> Widget {
        let mut widget = Widget::new(WidgetKind::Box, Point::new(x, y), Size::new(w, h));
        widget.id = id.to_string();
        widget
    }

    fn scene_snapshot(scene: &Scene) -> Vec<Widget> {
        let mut widgets: Vec<Widget> = scene.widgets().cloned().collect();
        widgets.sort_by(|a, b| a.id.cmp(&b.id));
        widgets
    }

    #[test]
    fn test_round_trip_preserves_scene() {
        let mut scene = Scene::new();
        let mut a = boxed("w1", 10.0, 20.0, 100.0, 50.0);
        a.z_index = 3;
        a.properties
            .insert("color".to_string(), Value::String("#ff8800".to_string()));
        scene.add_widget(a);
        let mut b = Widget::new(
            WidgetKind::Text,
            Point::new(5.0, 5.0),
            Size::new(80.0, 20.0),
        );
        b.id = "w2".to_string();
        b.properties
            .insert("text".to_string(), Value::String("Back at it".to_string()));
        scene.add_widget(b);

        let json = LayoutDocument::from_scene(&scene).to_json().unwrap();
        let loaded = LayoutDocument::from_json(&json).unwrap().into_scene().unwrap();

        assert_eq!(scene_snapshot(&loaded), scene_snapshot(&scene));
        assert_eq!(loaded.next_z_index(), scene.next_z_index());
    }

    #[test]
    fn test_persisted_shape_uses_camel_case() {
        let mut scene = Scene::new();
        scene.add_widget(boxed("w1", 0.0, 0.0, 10.0, 10.0));
        let json = LayoutDocument::from_scene(&scene).to_json().unwrap();
        assert!(json.contains("\"nextZIndex\""));
        assert!(json.contains("\"zIndex\""));
        assert!(json.contains("\"type\": \"box\""));
        assert!(json.contains("\"width\""));
    }

    #[test]
    fn test_group_children_round_trip_through_properties() {
        let mut scene = Scene::new();
        scene.add_widget(boxed("w1", 0.0, 0.0, 10.0, 10.0));
        scene.add_widget(boxed("w2", 30.0, 0.0, 10.0, 10.0));
        let mut group = Widget::new(
            WidgetKind::Group(GroupData {
                child_ids: vec!["w1".to_string(), "w2".to_string()],
                child_z: vec![0, 1],
            }),
            Point::new(-10.0, -10.0),
            Size::new(100.0, 100.0),
        );
        group.id = "g1".to_string();
        scene.add_widget(group);

        let document = LayoutDocument::from_scene(&scene);
        let record = document
            .widgets
            .iter()
            .find(|record| record.id == "g1")
            .unwrap();
        assert_eq!(record.widget_type, "group");
        assert_eq!(
            record.properties.get(CHILD_IDS_KEY),
            Some(&serde_json::json!(["w1", "w2"]))
        );

        let loaded = document.into_scene().unwrap();
        let data = loaded.get("g1").unwrap().as_group().unwrap();
        assert_eq!(data.child_ids, vec!["w1".to_string(), "w2".to_string()]);
        assert_eq!(data.child_z, vec![0, 1]);
        // The marker keys moved back into the kind, not the open bag.
        assert!(!loaded.get("g1").unwrap().properties.contains_key(CHILD_IDS_KEY));
    }

    #[test]
    fn test_unknown_type_preserved_opaquely() {
        let json = r#"{
            "widgets": [{
                "id": "w9",
                "position": { "x": 1.0, "y": 2.0 },
                "size": { "width": 30.0, "height": 40.0 },
                "zIndex": 7,
                "type": "countdown",
                "properties": { "format": "mm:ss" }
            }],
            "nextZIndex": 8
        }"#;
        let scene = LayoutDocument::from_json(json).unwrap().into_scene().unwrap();
        let widget = scene.get("w9").unwrap();
        assert_eq!(widget.kind, WidgetKind::Other("countdown".to_string()));

        let out = LayoutDocument::from_scene(&scene).to_json().unwrap();
        assert!(out.contains("\"countdown\""));
        assert!(out.contains("\"mm:ss\""));
    }

    #[test]
    fn test_duplicate_id_is_an_error() {
        let json = r#"{
            "widgets": [
                { "id": "w1", "position": {"x":0.0,"y":0.0}, "size": {"width":1.0,"height":1.0}, "zIndex": 0, "type": "box" },
                { "id": "w1", "position": {"x":9.0,"y":9.0}, "size": {"width":1.0,"height":1.0}, "zIndex": 1, "type": "box" }
            ],
            "nextZIndex": 2
        }"#;
        let result = LayoutDocument::from_json(json).unwrap().into_scene();
        assert!(matches!(result, Err(DocumentError::DuplicateId(id)) if id == "w1"));
    }

    #[test]
    fn test_malformed_documents_are_errors() {
        assert!(matches!(
            LayoutDocument::from_json("not json"),
            Err(DocumentError::Parse(_))
        ));
        // Missing required fields.
        assert!(LayoutDocument::from_json(r#"{ "widgets": [{ "id": "w1" }], "nextZIndex": 0 }"#).is_err());
        // A group without childIds.
        let json = r#"{
            "widgets": [{
                "id": "g1",
                "position": {"x":0.0,"y":0.0},
                "size": {"width":100.0,"height":100.0},
                "zIndex": 0,
                "type": "group",
                "properties": {}
            }],
            "nextZIndex": 1
        }"#;
        assert!(matches!(
            LayoutDocument::from_json(json).unwrap().into_scene(),
            Err(DocumentError::MalformedChildIds(id)) if id == "g1"
        ));
    }

    #[test]
    fn test_lagging_counter_is_raised_on_load() {
        let json = r#"{
            "widgets": [
                { "id": "w1", "position": {"x":0.0,"y":0.0}, "size": {"width":1.0,"height":1.0}, "zIndex": 9, "type": "box" }
            ],
            "nextZIndex": 2
        }"#;
        let scene = LayoutDocument::from_json(json).unwrap().into_scene().unwrap();
        assert_eq!(scene.next_z_index(), 10);
    }
}
