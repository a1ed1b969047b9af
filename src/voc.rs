//! PascalVOC annotation documents.
//!
//! Only the elements the YOLO conversion reads are modelled; everything else in the file
//! (`folder`, `source`, `segmented`, `pose`, ...) is ignored.

use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::BoundingBox;

// Root <annotation> element
#[derive(Debug, Deserialize, Clone)]
#[serde(rename = "annotation")]
pub struct VocAnnotation {
    pub filename: String,
    pub size: VocSize,
    #[serde(rename = "object", default)]
    pub objects: Vec<VocObject>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct VocSize {
    pub width: u32,
    pub height: u32,
}

// The box is optional here because objects of unknown classes are dropped before
// their coordinates are ever looked at.
#[derive(Debug, Deserialize, Clone)]
pub struct VocObject {
    pub name: String,
    pub bndbox: Option<VocBndBox>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct VocBndBox {
    pub xmin: Option<String>,
    pub ymin: Option<String>,
    pub xmax: Option<String>,
    pub ymax: Option<String>,
}

impl VocAnnotation {
    /// Parse a PascalVOC XML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let annotation: VocAnnotation = quick_xml::de::from_reader(BufReader::new(file))
            .map_err(|source| Error::Xml {
                path: path.to_path_buf(),
                source,
            })?;
        annotation.validate(path)?;
        Ok(annotation)
    }

    /// Parse a PascalVOC document held in memory. `path` is only used in error messages.
    pub fn parse_str(xml: &str, path: &Path) -> Result<Self> {
        let annotation: VocAnnotation =
            quick_xml::de::from_str(xml).map_err(|source| Error::Xml {
                path: path.to_path_buf(),
                source,
            })?;
        annotation.validate(path)?;
        Ok(annotation)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.filename.is_empty() {
            return Err(Error::MissingElement {
                path: path.to_path_buf(),
                element: "filename",
            });
        }
        if self.size.width == 0 || self.size.height == 0 {
            return Err(Error::ZeroImageSize {
                path: path.to_path_buf(),
                width: self.size.width,
                height: self.size.height,
            });
        }
        Ok(())
    }
}

impl VocObject {
    /// The object's box in pixel coordinates. Missing or non-numeric corners are errors.
    pub fn bounding_box(&self, path: &Path) -> Result<BoundingBox> {
        let bndbox = self.bndbox.as_ref().ok_or_else(|| Error::MissingElement {
            path: path.to_path_buf(),
            element: "bndbox",
        })?;
        Ok(BoundingBox::new(
            parse_coordinate(bndbox.xmin.as_deref(), "bndbox/xmin", path)?,
            parse_coordinate(bndbox.ymin.as_deref(), "bndbox/ymin", path)?,
            parse_coordinate(bndbox.xmax.as_deref(), "bndbox/xmax", path)?,
            parse_coordinate(bndbox.ymax.as_deref(), "bndbox/ymax", path)?,
        ))
    }
}

fn parse_coordinate(text: Option<&str>, element: &'static str, path: &Path) -> Result<f64> {
    let text = text.ok_or_else(|| Error::MissingElement {
        path: path.to_path_buf(),
        element,
    })?;
    text.trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidNumber {
            path: path.to_path_buf(),
            element,
            value: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
<annotation>
    <folder>images</folder>
    <filename>site_01.jpg</filename>
    <size>
        <width>640</width>
        <height>480</height>
        <depth>3</depth>
    </size>
    <segmented>0</segmented>
    <object>
        <name>helmet</name>
        <pose>Unspecified</pose>
        <truncated>0</truncated>
        <difficult>0</difficult>
        <bndbox>
            <xmin>12</xmin>
            <ymin>20.5</ymin>
            <xmax>100</xmax>
            <ymax>140</ymax>
        </bndbox>
    </object>
    <object>
        <name>vest</name>
        <bndbox>
            <xmin>200</xmin>
            <ymin>210</ymin>
            <xmax>300</xmax>
            <ymax>400</ymax>
        </bndbox>
    </object>
</annotation>
"#;

    #[test]
    fn test_parse_annotation() {
        let annotation = VocAnnotation::parse_str(SAMPLE, Path::new("site_01.xml")).unwrap();

        assert_eq!(annotation.filename, "site_01.jpg");
        assert_eq!(annotation.size.width, 640);
        assert_eq!(annotation.size.height, 480);
        assert_eq!(annotation.objects.len(), 2);
        assert_eq!(annotation.objects[1].name, "vest");

        let bbox = annotation.objects[0]
            .bounding_box(Path::new("site_01.xml"))
            .unwrap();
        assert_eq!(bbox, BoundingBox::new(12.0, 20.5, 100.0, 140.0));
    }

    #[test]
    fn test_no_objects() {
        let xml = "<annotation><filename>a.jpg</filename>\
                   <size><width>10</width><height>10</height></size></annotation>";
        let annotation = VocAnnotation::parse_str(xml, Path::new("a.xml")).unwrap();
        assert!(annotation.objects.is_empty());
    }

    #[test]
    fn test_missing_size_is_error() {
        let xml = "<annotation><filename>a.jpg</filename></annotation>";
        let result = VocAnnotation::parse_str(xml, Path::new("a.xml"));
        assert!(matches!(result, Err(Error::Xml { .. })));
    }

    #[test]
    fn test_zero_size_is_error() {
        let xml = "<annotation><filename>a.jpg</filename>\
                   <size><width>0</width><height>10</height></size></annotation>";
        let result = VocAnnotation::parse_str(xml, Path::new("a.xml"));
        assert!(matches!(result, Err(Error::ZeroImageSize { .. })));
    }

    #[test]
    fn test_bad_coordinate() {
        let object = VocObject {
            name: "hat".to_string(),
            bndbox: Some(VocBndBox {
                xmin: Some("ten".to_string()),
                ymin: Some("1".to_string()),
                xmax: Some("2".to_string()),
                ymax: Some("3".to_string()),
            }),
        };
        let result = object.bounding_box(Path::new("a.xml"));
        assert!(matches!(
            result,
            Err(Error::InvalidNumber { element: "bndbox/xmin", .. })
        ));

        let object = VocObject {
            name: "hat".to_string(),
            bndbox: None,
        };
        assert!(matches!(
            object.bounding_box(Path::new("a.xml")),
            Err(Error::MissingElement { element: "bndbox", .. })
        ));
    }
}
