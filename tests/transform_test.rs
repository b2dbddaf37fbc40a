// End-to-end conversions between CMME and MEI through the public API

use notation_bridge::{
    detect_xml_format, transform, validate, ConversionError, Format, ParseError, TransformWarning,
};

fn cmme_with(notes: &str) -> String {
    format!(
        r#"<cmme>
    <metadata><title>Test</title><composer>Anonymous</composer></metadata>
    <score>
        <staff name="Cantus" id="1">
            <clef shape="C" line="1"/>
            <measure number="1">
                {}
            </measure>
        </staff>
    </score>
</cmme>"#,
        notes
    )
}

fn to_mei(cmme: &str) -> String {
    let result = transform(cmme, "cmme-to-mei").expect("CMME → MEI should succeed");
    assert!(
        !result
            .warnings
            .iter()
            .any(|w| matches!(w, TransformWarning::OutputValidation { .. })),
        "unexpected warnings: {:?}",
        result.warnings
    );
    result.output
}

fn to_cmme(mei: &str) -> String {
    transform(mei, "mei-to-cmme")
        .expect("MEI → CMME should succeed")
        .output
}

#[test]
fn test_round_trip_preserves_pitch_and_duration() {
    let mei = to_mei(&cmme_with(r#"<note pitch="C4" duration="quarter"/>"#));
    assert!(mei.contains(r#"<note pname="c" oct="4" dur="4"/>"#), "{}", mei);

    let cmme = to_cmme(&mei);
    assert!(cmme.contains(r#"<note pitch="C4" duration="quarter"/>"#), "{}", cmme);
}

#[test]
fn test_dots() {
    let mei = to_mei(&cmme_with(
        r#"<note pitch="G4" duration="half dot"/>
           <note pitch="A4" duration="half double-dot"/>"#,
    ));
    assert!(mei.contains(r#"<note pname="g" oct="4" dur="2" dots="1"/>"#), "{}", mei);
    assert!(mei.contains(r#"<note pname="a" oct="4" dur="2" dots="2"/>"#), "{}", mei);

    let cmme = to_cmme(&mei);
    assert!(cmme.contains(r#"duration="half dot""#), "{}", cmme);
    assert!(cmme.contains(r#"duration="half double-dot""#), "{}", cmme);
}

#[test]
fn test_accidentals() {
    let mei = to_mei(&cmme_with(
        r#"<note pitch="C#4" duration="whole"/>
           <note pitch="Cb4" duration="whole"/>"#,
    ));
    assert!(mei.contains(r#"<note pname="c" oct="4" accid="s" dur="1"/>"#), "{}", mei);
    assert!(mei.contains(r#"<note pname="c" oct="4" accid="f" dur="1"/>"#), "{}", mei);

    let cmme = to_cmme(&mei);
    assert!(cmme.contains(r#"pitch="C#4""#), "{}", cmme);
    assert!(cmme.contains(r#"pitch="Cb4""#), "{}", cmme);
}

#[test]
fn test_musica_ficta() {
    let mei = to_mei(&cmme_with(
        r#"<note pitch="C.4" duration="brevis"/>
           <note pitch="C.#4" duration="brevis"/>"#,
    ));
    assert!(mei.contains(r#"<note pname="c" oct="4" accid.ges="n" dur="breve"/>"#), "{}", mei);
    assert!(mei.contains(r#"<note pname="c" oct="4" accid.ges="s" dur="breve"/>"#), "{}", mei);
    assert!(!mei.contains(" accid="), "{}", mei);

    let cmme = to_cmme(&mei);
    assert!(cmme.contains(r#"pitch="C.4""#), "{}", cmme);
    assert!(cmme.contains(r#"pitch="C.#4""#), "{}", cmme);
}

#[test]
fn test_ligature_is_stable_over_two_round_trips() {
    let source = cmme_with(
        r#"<note pitch="D4" duration="longa"><ligature position="start"/></note>
           <note pitch="E4" duration="longa"><ligature position="end"/></note>"#,
    );
    let mei = to_mei(&source);
    assert!(mei.contains(r#"<ligature form="initial"/>"#), "{}", mei);
    assert!(mei.contains(r#"<ligature form="terminal"/>"#), "{}", mei);

    let cmme = to_cmme(&mei);
    assert!(cmme.contains(r#"<ligature position="start"/>"#), "{}", cmme);
    assert!(cmme.contains(r#"<ligature position="end"/>"#), "{}", cmme);

    assert_eq!(to_mei(&cmme), mei);
}

#[test]
fn test_mensuration_signs() {
    let mei = to_mei(&cmme_with(
        r#"<note pitch="F4" duration="brevis"><mensuration sign="C."/></note>
           <note pitch="F4" duration="brevis"><mensuration sign="O/"/></note>"#,
    ));
    assert!(mei.contains(r#"<mensur sign="C" dot="true"/>"#), "{}", mei);
    assert!(mei.contains(r#"<mensur sign="O" slash="true"/>"#), "{}", mei);

    let cmme = to_cmme(&mei);
    assert!(cmme.contains(r#"<mensuration sign="C."/>"#), "{}", cmme);
    assert!(cmme.contains(r#"<mensuration sign="O/"/>"#), "{}", cmme);
}

#[test]
fn test_coloration() {
    let mei = to_mei(&cmme_with(
        r#"<note pitch="B3" duration="whole"><coloration type="red"/></note>"#,
    ));
    assert!(mei.contains(r#"<note pname="b" oct="3" dur="1" colored="true" color="red"/>"#), "{}", mei);

    let cmme = to_cmme(&mei);
    assert!(cmme.contains(r#"<coloration type="red"/>"#), "{}", cmme);
}

#[test]
fn test_unmapped_attribute_passes_through() {
    let mei = to_mei(&cmme_with(r#"<note pitch="C4" duration="quarter" foo="bar"/>"#));
    assert!(mei.contains(r#"cmme:foo="bar""#), "{}", mei);
    assert!(mei.contains(r#"xmlns:cmme="#), "{}", mei);

    let cmme = to_cmme(&mei);
    assert!(cmme.contains(r#"<note pitch="C4" duration="quarter" foo="bar"/>"#), "{}", cmme);
}

#[test]
fn test_identifiers_map_to_xml_id() {
    let mei = to_mei(&cmme_with(r#"<note pitch="C4" duration="quarter" id="n1"/>"#));
    assert!(mei.contains(r#"<note xml:id="n1" pname="c""#), "{}", mei);

    let cmme = to_cmme(&mei);
    assert!(cmme.contains(r#"id="n1""#), "{}", cmme);
    assert!(!cmme.contains("xml:id"), "{}", cmme);
}

#[test]
fn test_metadata_and_staff_setup_survive() {
    let mei = to_mei(&cmme_with(r#"<note pitch="C4" duration="quarter"/>"#));
    assert!(mei.contains("<title>Test</title>"), "{}", mei);
    assert!(mei.contains("<composer>Anonymous</composer>"), "{}", mei);
    assert!(mei.contains(r#"clef.shape="C" clef.line="1""#), "{}", mei);

    let cmme = to_cmme(&mei);
    assert!(cmme.contains("<title>Test</title>"), "{}", cmme);
    assert!(cmme.contains(r#"<staff name="Cantus" id="1">"#), "{}", cmme);
    assert!(cmme.contains(r#"<clef shape="C" line="1"/>"#), "{}", cmme);
}

#[test]
fn test_output_has_declaration_and_namespace() {
    let mei = to_mei(&cmme_with(r#"<rest duration="minima"/>"#));
    assert!(mei.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<mei xmlns=\"http://www.music-encoding.org/ns/mei\""), "{}", mei);
    assert!(mei.contains(r#"<rest dur="2"/>"#), "{}", mei);
}

#[test]
fn test_messy_mei_input() {
    let input = "\u{feff}<?xml version=\"1.0\"?>\r\n<mei><music><body><mdiv><score>\r\n\
        <section><measure n=\"1\"><staff n=\"1\"><layer n=\"1\">\
        <note pname=\"e\" oct=\"5\" dur=\"8\"/></layer></staff></measure></section>\
        </score></mdiv></body></music></mei>\r\n";
    let cmme = to_cmme(input);
    assert!(cmme.contains(r#"<note pitch="E5" duration="eighth"/>"#), "{}", cmme);
    assert!(cmme.contains(r#"<staff name="Staff 1" id="1">"#), "{}", cmme);
}

#[test]
fn test_token_errors() {
    let cmme = cmme_with(r#"<note pitch="C4" duration="quarter"/>"#);
    assert!(matches!(
        transform(&cmme, "cmme_to_mei"),
        Err(ConversionError::TokenFormat(_))
    ));

    let err = transform(&cmme, "cmme-to-xyz").unwrap_err();
    let message = err.to_string();
    for format in ["cmme", "mei", "json"] {
        assert!(message.contains(format), "{}", message);
    }
    assert!(matches!(err, ConversionError::UnsupportedFormat { .. }));
}

#[test]
fn test_missing_duration_names_index_and_field() {
    let cmme = cmme_with(
        r#"<note pitch="C4" duration="quarter"/>
           <note pitch="D4" duration="quarter"/>
           <note pitch="E4"/>"#,
    );
    let err = transform(&cmme, "cmme-to-mei").unwrap_err();
    assert_eq!(
        err,
        ConversionError::Parse(ParseError::missing_attribute("note", 2, "duration"))
    );
    let message = err.to_string();
    assert!(message.contains('2') && message.contains("duration"), "{}", message);
}

#[test]
fn test_malformed_xml_is_fatal() {
    assert!(matches!(
        transform("<cmme><score>", "cmme-to-mei"),
        Err(ConversionError::Parse(ParseError::XmlSyntax(_)))
    ));
}

#[test]
fn test_detection_and_validation() {
    let cmme = cmme_with(r#"<note pitch="C4" duration="quarter"/>"#);
    let mei = to_mei(&cmme);
    assert_eq!(detect_xml_format(&cmme), Some(Format::Cmme));
    assert_eq!(detect_xml_format(&mei), Some(Format::Mei));
    assert_eq!(detect_xml_format("<score/>"), None);

    assert_eq!(validate(&cmme, Format::Cmme), Ok(()));
    assert_eq!(validate(&mei, Format::Mei), Ok(()));
    assert!(validate(&cmme, Format::Mei).is_err());
}

#[test]
fn test_chord_keeps_non_note_children() {
    let mei = to_mei(&cmme_with(
        r#"<chord><note pitch="C4" duration="whole"/><note pitch="E4" duration="whole"/><articulation type="accent"/></chord>"#,
    ));
    assert!(mei.contains(r#"<artic cmme:type="accent"/>"#), "{}", mei);

    let cmme = to_cmme(&mei);
    assert!(cmme.contains(r#"<articulation type="accent"/>"#), "{}", cmme);
    assert!(cmme.contains(r#"<note pitch="E4" duration="whole"/>"#), "{}", cmme);
}

#[test]
fn test_coloration_extra_attributes() {
    let source = cmme_with(r#"<note pitch="B3" duration="whole"><coloration type="red" style="full"/></note>"#);
    let cmme = transform(&source, "cmme-to-cmme").unwrap().output;
    assert!(cmme.contains(r#"<coloration type="red" style="full"/>"#), "{}", cmme);

    let mei = to_mei(&source);
    assert!(mei.contains(r#"colored="true" color="red" cmme:style="full""#), "{}", mei);
}

#[test]
fn test_unnumbered_mei_staff_is_kept() {
    let mei = r#"<mei xmlns="http://www.music-encoding.org/ns/mei"><music><body><mdiv><score>
        <scoreDef><staffGrp><staffDef n="1"/><staffDef n="2"/></staffGrp></scoreDef>
        <section><measure n="1">
            <staff n="1"><layer n="1"><note pname="c" oct="4" dur="1"/></layer></staff>
            <staff><layer n="1"><note pname="g" oct="3" dur="1"/></layer></staff>
        </measure></section>
    </score></mdiv></body></music></mei>"#;
    let result = transform(mei, "mei-to-cmme").unwrap();
    assert!(result.output.contains(r#"<note pitch="G3" duration="whole"/>"#), "{}", result.output);
    assert!(result.warnings.contains(&TransformWarning::UnnumberedStaff {
        place: "measure 1".to_string(),
        assigned: "2".to_string(),
    }));
}
