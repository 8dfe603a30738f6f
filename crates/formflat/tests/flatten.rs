mod common;

use common::{
    FormBuilder, PageSpec, count_operator, media_box, page_operations, rect, shown_text, text,
};
use formflat::{
    Annotation, AnnotationStore, Color, FormDocument, FormFieldRegistry, FormOptions, PdfError,
    Rect,
};
use lopdf::dictionary;

/// Three letter pages; the middle one is cropped and carries a text field.
fn cropped_form() -> Vec<u8> {
    let pages = vec![
        PageSpec::letter(),
        PageSpec::letter().with_crop_box([36, 36, 576, 756]),
        PageSpec::letter(),
    ];
    let mut builder = FormBuilder::new(pages);
    let id = builder.add_widget(
        Some(1),
        dictionary! {
            "FT" => "Tx",
            "T" => text("name"),
            "Rect" => rect([100, 600, 300, 620]),
        },
    );
    builder.add_field(id);
    builder.build()
}

#[test]
fn text_value_is_drawn_on_cropped_page() {
    let doc = FormDocument::open(&cropped_form(), None).unwrap();
    let mut form = doc.discover();
    assert_eq!(form.registry.set_value_by_name("name", "Hello"), 1);

    let output = doc.flatten(&form.registry).unwrap();
    assert_eq!(output.page_count(), 3);
    let bytes = output.to_bytes().unwrap();
    assert_eq!(media_box(&bytes, 2), [36.0, 36.0, 576.0, 756.0]);
    assert_eq!(media_box(&bytes, 1), [0.0, 0.0, 612.0, 792.0]);

    let shown = shown_text(&page_operations(&bytes, 2));
    assert_eq!(shown.len(), 1);
    let (string, x, y) = &shown[0];
    assert_eq!(string, b"Hello");
    assert!(*x >= 100.0 && *x < 300.0);
    assert!(*y >= 600.0 && *y < 620.0);

    for page in [1, 3] {
        assert!(shown_text(&page_operations(&bytes, page)).is_empty());
    }
}

#[test]
fn exactly_one_radio_marker_is_filled() {
    let mut builder = FormBuilder::new(vec![PageSpec::letter()]);
    builder.add_radio_group("choice", 0, &["a", "b", "c"], Some("b"));
    let doc = FormDocument::open(&builder.build(), None).unwrap();

    let form = doc.discover();
    let bytes = doc.flatten(&form.registry).unwrap().to_bytes().unwrap();
    let ops = page_operations(&bytes, 1);
    assert_eq!(count_operator(&ops, "B"), 1);
    assert_eq!(count_operator(&ops, "S"), 2);
}

#[test]
fn toggling_a_radio_moves_the_marker() {
    let mut builder = FormBuilder::new(vec![PageSpec::letter()]);
    builder.add_radio_group("choice", 0, &["a", "b", "c"], Some("b"));
    let doc = FormDocument::open(&builder.build(), None).unwrap();

    let mut form = doc.discover();
    for field in form.registry.fields_for_page_mut(1) {
        field.clear_value();
    }
    let bytes = doc.flatten(&form.registry).unwrap().to_bytes().unwrap();
    assert_eq!(count_operator(&page_operations(&bytes, 1), "B"), 0);

    form.registry.fields_for_page_mut(1)[0].toggle();
    let bytes = doc.flatten(&form.registry).unwrap().to_bytes().unwrap();
    let ops = page_operations(&bytes, 1);
    assert_eq!(count_operator(&ops, "B"), 1);
    // The first widget sits at x = 100 with a 12pt square.
    let filled_at = ops.iter().position(|op| op.operator == "B").unwrap();
    let re = &ops[filled_at - 1];
    assert_eq!(re.operator, "re");
    let x = re.operands[0].as_float().unwrap();
    assert!(x > 100.0 && x < 112.0);
}

#[test]
fn flattening_twice_gives_the_same_geometry() {
    let doc = FormDocument::open(&cropped_form(), None).unwrap();
    let mut form = doc.discover();
    form.registry.set_value_by_name("name", "Hello");

    let first = doc.flatten(&form.registry).unwrap();
    let second = doc.flatten(&form.registry).unwrap();
    assert_eq!(first.page_count(), second.page_count());
    assert_eq!(first.page_bounds(), second.page_bounds());
    assert_ne!(first.path(), second.path());
}

#[test]
fn rotated_pages_swap_output_bounds() {
    let pages = vec![
        PageSpec::letter().with_rotate(90),
        PageSpec::letter().with_rotate(180),
        PageSpec::letter().with_rotate(-90),
    ];
    let doc = FormDocument::open(&FormBuilder::new(pages).build(), None).unwrap();
    let output = doc.flatten(&FormFieldRegistry::new()).unwrap();
    assert_eq!(
        output.page_bounds(),
        &[
            Rect::new(0.0, 0.0, 792.0, 612.0),
            Rect::new(0.0, 0.0, 612.0, 792.0),
            Rect::new(0.0, 0.0, 792.0, 612.0),
        ]
    );
    let bytes = output.to_bytes().unwrap();
    assert_eq!(media_box(&bytes, 1), [0.0, 0.0, 792.0, 612.0]);
}

#[test]
fn source_content_is_replayed_through_a_form_xobject() {
    let doc = FormDocument::open(&cropped_form(), None).unwrap();
    let bytes = doc
        .flatten(&FormFieldRegistry::new())
        .unwrap()
        .to_bytes()
        .unwrap();
    let ops = page_operations(&bytes, 1);
    let names: Vec<&str> = ops.iter().map(|op| op.operator.as_str()).collect();
    assert_eq!(names, vec!["q", "cm", "Do", "Q"]);

    let output = lopdf::Document::load_mem(&bytes).unwrap();
    let replayed = output
        .objects
        .values()
        .filter_map(|o| o.as_stream().ok())
        .filter(|s| s.content == b"0.5 g 72 72 144 144 re f".to_vec())
        .count();
    assert_eq!(replayed, 3);
}

#[test]
fn output_lands_in_configured_temp_dir() {
    let dir = tempfile::tempdir().unwrap();
    let options = FormOptions {
        temp_dir: Some(dir.path().to_path_buf()),
        ..FormOptions::default()
    };
    let doc = FormDocument::open(&cropped_form(), Some(options)).unwrap();
    let output = doc.flatten(&FormFieldRegistry::new()).unwrap();
    assert!(output.path().starts_with(dir.path()));

    let kept = output.keep().unwrap();
    assert!(kept.exists());
}

#[test]
fn save_failure_reports_io_error() {
    let doc = FormDocument::open(&cropped_form(), None).unwrap();
    let output = doc.flatten(&FormFieldRegistry::new()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let err = output
        .save(dir.path().join("no-such-dir").join("out.pdf"))
        .unwrap_err();
    assert!(matches!(err, PdfError::IoError(_)));
    assert!(output.path().exists());

    let dest = dir.path().join("out.pdf");
    output.save(&dest).unwrap();
    assert_eq!(std::fs::read(dest).unwrap(), output.to_bytes().unwrap());
}

#[test]
fn missing_temp_dir_fails_flattening() {
    let dir = tempfile::tempdir().unwrap();
    let options = FormOptions {
        temp_dir: Some(dir.path().join("missing")),
        ..FormOptions::default()
    };
    let doc = FormDocument::open(&cropped_form(), Some(options)).unwrap();
    let err = doc.flatten(&FormFieldRegistry::new()).unwrap_err();
    assert!(matches!(err, PdfError::IoError(_)));
}

#[test]
fn background_flatten_uses_a_registry_snapshot() {
    let doc = FormDocument::open(&cropped_form(), None).unwrap();
    let mut form = doc.discover();
    form.registry.set_value_by_name("name", "Hello");

    let task = doc.flatten_in_background(&form.registry);
    form.registry.set_value_by_name("name", "Changed later");
    let output = task.join().unwrap();

    let bytes = output.to_bytes().unwrap();
    let shown = shown_text(&page_operations(&bytes, 2));
    assert_eq!(shown[0].0, b"Hello");
}

#[test]
fn annotations_are_burned_after_field_values() {
    let doc = FormDocument::open(&cropped_form(), None).unwrap();
    let mut form = doc.discover();
    form.registry.set_value_by_name("name", "Hello");

    let mut annotations = AnnotationStore::new();
    annotations.add(
        2,
        Annotation::text(Rect::new(100.0, 400.0, 300.0, 50.0), "Reviewed\nby QA", 12.0),
    );
    annotations.add(
        2,
        Annotation::stroke(
            vec![(100.0, 380.0), (200.0, 390.0), (300.0, 380.0)],
            2.0,
            Color::new(1.0, 0.0, 0.0),
        ),
    );
    let output = doc.flatten_with_annotations(&form.registry, &annotations).unwrap();
    let bytes = output.to_bytes().unwrap();

    let ops = page_operations(&bytes, 2);
    let shown: Vec<Vec<u8>> = shown_text(&ops).into_iter().map(|(s, _, _)| s).collect();
    assert_eq!(
        shown,
        vec![b"Hello".to_vec(), b"Reviewed".to_vec(), b"by QA".to_vec()]
    );
    let names: Vec<&str> = ops.iter().map(|op| op.operator.as_str()).collect();
    let last_text = names.iter().rposition(|n| *n == "Tj").unwrap();
    let stroke = names.iter().position(|n| *n == "S").unwrap();
    assert!(last_text < stroke);
    assert_eq!(count_operator(&ops, "l"), 2);

    for page in [1, 3] {
        assert_eq!(count_operator(&page_operations(&bytes, page), "Tj"), 0);
    }
}

#[test]
fn background_flatten_snapshots_annotations() {
    let doc = FormDocument::open(&cropped_form(), None).unwrap();
    let form = doc.discover();
    let mut annotations = AnnotationStore::new();
    annotations.add(1, Annotation::text(Rect::new(72.0, 700.0, 200.0, 20.0), "Draft", 10.0));

    let task = doc.flatten_with_annotations_in_background(&form.registry, &annotations);
    annotations.clear_page(1);
    let bytes = task.join().unwrap().to_bytes().unwrap();
    let shown = shown_text(&page_operations(&bytes, 1));
    assert_eq!(shown[0].0, b"Draft");
}
