//! Canvas-size sidecar reader.
//!
//! Tiling runs leave a `vips-properties.xml` next to the tile tree
//! recording the source raster's pixel dimensions. The file is the only
//! authoritative canvas size available at stitch time, but it is
//! optional: any parse problem degrades to "size unknown" rather than
//! failing the stitch.

use std::path::Path;

use tracing::debug;

/// Read the full canvas `(width, height)` from a properties sidecar.
///
/// Returns `None` unless both a `width` and a `height` property are
/// present and parse as integers. Namespaces and extra attributes are
/// ignored; only local element names matter.
pub fn read_canvas_size(xml_path: &Path) -> Option<(u32, u32)> {
    let text = match std::fs::read_to_string(xml_path) {
        Ok(text) => text,
        Err(err) => {
            debug!(path = %xml_path.display(), error = %err, "Sidecar not readable");
            return None;
        }
    };
    let doc = match roxmltree::Document::parse(&text) {
        Ok(doc) => doc,
        Err(err) => {
            debug!(path = %xml_path.display(), error = %err, "Sidecar not parseable");
            return None;
        }
    };

    let mut width: Option<u32> = None;
    let mut height: Option<u32> = None;
    for property in doc
        .descendants()
        .filter(|node| node.tag_name().name() == "property")
    {
        let name = property
            .children()
            .find(|child| child.tag_name().name() == "name")
            .and_then(|child| child.text())
            .map(|text| text.trim().to_ascii_lowercase());
        let value = property
            .children()
            .find(|child| child.tag_name().name() == "value")
            .and_then(|child| child.text())
            .and_then(|text| text.trim().parse::<u32>().ok());

        match (name.as_deref(), value) {
            (Some("width"), Some(v)) => width = Some(v),
            (Some("height"), Some(v)) => height = Some(v),
            _ => {}
        }
    }

    match (width, height) {
        (Some(w), Some(h)) => Some((w, h)),
        _ => {
            debug!(
                path = %xml_path.display(),
                "Sidecar missing width/height properties"
            );
            None
        }
    }
}

/// Serialize a properties sidecar for a freshly cut pyramid.
///
/// Deliberately carries no timestamp so rebuilding an unchanged pyramid
/// produces a byte-identical file.
pub fn write_canvas_size_xml(width: u32, height: u32) -> String {
    format!(
        r#"<?xml version="1.0"?>
<image xmlns="http://www.vips.ecs.soton.ac.uk/dzsave">
  <properties>
    <property>
      <name>width</name>
      <value type="gint">{width}</value>
    </property>
    <property>
      <name>height</name>
      <value type="gint">{height}</value>
    </property>
  </properties>
</image>
"#
    )
}
