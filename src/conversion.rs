use log::{debug, info};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::ConversionStats;
use crate::utils::{create_progress_bar, ensure_directory, list_files_with_suffixes};
use crate::voc::VocAnnotation;

pub const CLASSES_FILE: &str = "classes.txt";
pub const ANNOTATIONS_DIR: &str = "annotations";
pub const LABELS_DIR: &str = "labels";

/// Class name to dense id, in declaration order of the class list.
#[derive(Debug, Clone, Default)]
pub struct ClassMapping {
    ids: HashMap<String, usize>,
    names: Vec<String>,
}

impl ClassMapping {
    /// Build the mapping from a whitespace-separated class list.
    ///
    /// A name listed twice keeps its last position.
    pub fn from_class_list(text: &str) -> Self {
        let names: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let ids = names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.clone(), id))
            .collect();
        Self { ids, names }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(Self::from_class_list(&text))
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Name of the label file for an annotated image: every `.jpg` in `image_filename` becomes `.txt`.
pub fn label_file_name(image_filename: &str) -> String {
    image_filename.replace(".jpg", ".txt")
}

/// Render the YOLO label lines for one annotation.
///
/// Objects whose class is not in `class_mapping` are left out and counted in `stats`.
pub fn convert_to_yolo_format(
    annotation: &VocAnnotation,
    class_mapping: &ClassMapping,
    source: &Path,
    stats: &mut ConversionStats,
) -> Result<String> {
    let image_width = annotation.size.width as f64;
    let image_height = annotation.size.height as f64;
    let mut yolo_data = String::with_capacity(annotation.objects.len() * 64);

    for object in &annotation.objects {
        let class_id = match class_mapping.get(&object.name) {
            Some(class_id) => class_id,
            None => {
                debug!("Skipping unknown class {:?} in {}", object.name, source.display());
                stats.objects_skipped += 1;
                continue;
            }
        };

        let label = object
            .bounding_box(source)?
            .normalize(class_id, image_width, image_height);
        yolo_data.push_str(&label.to_string());
        yolo_data.push('\n');
        stats.objects_written += 1;
    }

    Ok(yolo_data)
}

/// Convert one PascalVOC file and write its label file into `labels_dir`, replacing any
/// previous content.
pub fn process_annotation(
    xml_path: &Path,
    labels_dir: &Path,
    class_mapping: &ClassMapping,
    stats: &mut ConversionStats,
) -> Result<()> {
    let annotation = VocAnnotation::from_path(xml_path)?;
    let yolo_data = convert_to_yolo_format(&annotation, class_mapping, xml_path, stats)?;

    let label_output_path = labels_dir.join(label_file_name(&annotation.filename));
    let file = File::create(&label_output_path).map_err(|e| Error::io(&label_output_path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(yolo_data.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| Error::io(&label_output_path, e))?;

    debug!(
        "{} -> {}",
        xml_path.display(),
        label_output_path.display()
    );
    stats.files_converted += 1;
    Ok(())
}

/// Convert every `annotations/*.xml` under `input_dir` into `output_dir/labels/*.txt`.
///
/// `input_dir` must hold `classes.txt` and an `annotations/` directory. Files are processed in
/// name order and the first structural error aborts the run.
pub fn convert(input_dir: &Path, output_dir: &Path) -> Result<ConversionStats> {
    ensure_directory(output_dir)?;
    let class_mapping = ClassMapping::load(&input_dir.join(CLASSES_FILE))?;
    info!("Loaded {} classes", class_mapping.len());

    let labels_dir = ensure_directory(&output_dir.join(LABELS_DIR))?;
    let annotation_files = list_files_with_suffixes(&input_dir.join(ANNOTATIONS_DIR), &[".xml"])?;

    let pb = create_progress_bar(annotation_files.len() as u64, "Convert");
    let mut stats = ConversionStats::default();
    for xml_path in &annotation_files {
        if let Err(e) = process_annotation(xml_path, &labels_dir, &class_mapping, &mut stats) {
            pb.abandon();
            return Err(e);
        }
        pb.inc(1);
    }
    pb.finish_with_message("Conversion complete");

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;
    use crate::voc::{VocBndBox, VocObject, VocSize};

    fn object(name: &str, xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> VocObject {
        VocObject {
            name: name.to_string(),
            bndbox: Some(VocBndBox {
                xmin: Some(xmin.to_string()),
                ymin: Some(ymin.to_string()),
                xmax: Some(xmax.to_string()),
                ymax: Some(ymax.to_string()),
            }),
        }
    }

    #[test]
    fn test_class_mapping_order() {
        let mapping = ClassMapping::from_class_list("person\nhelmet  vest\n\nhat\n");
        assert_eq!(mapping.len(), 4);
        assert_eq!(mapping.get("person"), Some(0));
        assert_eq!(mapping.get("vest"), Some(2));
        assert_eq!(mapping.get("hat"), Some(3));
        assert_eq!(mapping.get("gloves"), None);
    }

    #[test]
    fn test_class_mapping_duplicate_keeps_last() {
        let mapping = ClassMapping::from_class_list("a b a");
        assert_eq!(mapping.get("a"), Some(2));
        assert_eq!(mapping.get("b"), Some(1));
    }

    #[test]
    fn test_label_file_name() {
        assert_eq!(label_file_name("foo.jpg"), "foo.txt");
        assert_eq!(label_file_name("foo.bar.jpg"), "foo.bar.txt");
        assert_eq!(label_file_name("a.jpg.b.jpg"), "a.txt.b.txt");
        assert_eq!(label_file_name("foo.png"), "foo.png");
        assert_eq!(label_file_name("foo.JPG"), "foo.JPG");
    }

    #[test]
    fn test_convert_to_yolo_format() {
        let annotation = VocAnnotation {
            filename: "site.jpg".to_string(),
            size: VocSize {
                width: 100,
                height: 50,
            },
            objects: vec![
                object("hat", 10.0, 10.0, 30.0, 30.0),
                object("dog", 0.0, 0.0, 5.0, 5.0),
            ],
        };
        let mapping = ClassMapping::from_class_list("person vest hat");
        let mut stats = ConversionStats::default();

        let yolo_data =
            convert_to_yolo_format(&annotation, &mapping, Path::new("site.xml"), &mut stats)
                .unwrap();

        assert_eq!(yolo_data, "2 0.2 0.4 0.2 0.4\n");
        assert_eq!(stats.objects_written, 1);
        assert_eq!(stats.objects_skipped, 1);
    }

    #[test]
    fn test_unknown_class_box_is_never_read() {
        let annotation = VocAnnotation {
            filename: "site.jpg".to_string(),
            size: VocSize {
                width: 10,
                height: 10,
            },
            objects: vec![VocObject {
                name: "dog".to_string(),
                bndbox: None,
            }],
        };
        let mapping = ClassMapping::from_class_list("hat");
        let mut stats = ConversionStats::default();

        let yolo_data =
            convert_to_yolo_format(&annotation, &mapping, Path::new("site.xml"), &mut stats)
                .unwrap();
        assert!(yolo_data.is_empty());
    }

    #[test]
    fn test_normalization_round_trip() {
        let sizes = [(640.0, 480.0), (1920.0, 1080.0), (33.0, 7.0)];
        let boxes = [
            BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            BoundingBox::new(12.5, 3.0, 30.25, 6.5),
            BoundingBox::new(1.0, 2.0, 33.0, 7.0),
        ];
        for &(w, h) in &sizes {
            for bbox in &boxes {
                let label = bbox.normalize(0, w, h);
                for v in [label.x_center, label.y_center, label.width, label.height] {
                    assert!((0.0..=1.0).contains(&v), "{} out of range", v);
                }
                let x_min = label.x_center * w - label.width * w / 2.0;
                let x_max = label.x_center * w + label.width * w / 2.0;
                let y_min = label.y_center * h - label.height * h / 2.0;
                let y_max = label.y_center * h + label.height * h / 2.0;
                assert!((x_min - bbox.x_min).abs() < 1e-9);
                assert!((x_max - bbox.x_max).abs() < 1e-9);
                assert!((y_min - bbox.y_min).abs() < 1e-9);
                assert!((y_max - bbox.y_max).abs() < 1e-9);
            }
        }
    }
}
