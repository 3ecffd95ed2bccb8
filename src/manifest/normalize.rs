use std::path::Path;

use serde_json::{Map, Value};

use super::{Manifest, ManifestParseError, TEMPLATES_BASE};
use crate::utils::path::relative_url_path;

/// Parse and normalize manifest text.
///
/// Fails only when `json` is not valid JSON. Recognized fields with an
/// unexpected shape are passed through as they are.
pub fn normalize(
    json: &str,
    template_dir: &Path,
    template_root: &Path,
) -> Result<Manifest, ManifestParseError> {
    let mut value: Value = serde_json::from_str(json)?;
    apply(&mut value, template_dir, template_root);
    Ok(Manifest(value))
}

/// Normalize an already parsed manifest document, leaving the input intact.
pub fn normalize_value(value: &Value, template_dir: &Path, template_root: &Path) -> Manifest {
    let mut value = value.clone();
    apply(&mut value, template_dir, template_root);
    Manifest(value)
}

fn apply(value: &mut Value, template_dir: &Path, template_root: &Path) {
    let Some(manifest) = value.as_object_mut() else {
        return;
    };
    rewrite_preview_images(manifest, template_dir, template_root);
    apply_schema_defaults(manifest);
}

/// Rewrite `./thumb.png` style entries to `/templates/<dir>/thumb.png`.
fn rewrite_preview_images(manifest: &mut Map<String, Value>, dir: &Path, root: &Path) {
    let Some(Value::Array(images)) = manifest.get_mut("previewImages") else {
        return;
    };

    for image in images.iter_mut() {
        let Value::String(path) = image else {
            continue;
        };
        if path.starts_with('.') {
            let relative = relative_url_path(root, &dir.join(path.as_str()));
            *path = format!("{TEMPLATES_BASE}{relative}");
        }
    }
}

/// Force every preset to carry each property's schema default.
///
/// Overwrites values a preset already provides for that key.
fn apply_schema_defaults(manifest: &mut Map<String, Value>) {
    let defaults: Vec<(String, Value)> = match manifest.get("schema") {
        Some(Value::Object(schema)) => schema
            .iter()
            .filter_map(|(key, property)| {
                let default = property.as_object()?.get("default")?;
                Some((key.clone(), default.clone()))
            })
            .collect(),
        _ => return,
    };

    if defaults.is_empty() {
        return;
    }

    let Some(Value::Object(presets)) = manifest.get_mut("previewData") else {
        return;
    };

    for preset in presets.values_mut() {
        let Value::Object(preset) = preset else {
            continue;
        };
        for (key, default) in &defaults {
            preset.insert(key.clone(), default.clone());
        }
    }
}
