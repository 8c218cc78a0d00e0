use precios_to_csv::{Channel, ConvertError, ReportFamily};
use pretty_assertions::assert_eq;

use precios_worker::error::ApiError;
use precios_worker::keys::{decode_object_key, is_pdf_key, output_keys, parse_flag};
use precios_worker::models::{ConversionResponse, ConversionStatus, format_timestamp};
use precios_worker::routes::parse_event;
use precios_worker::storage_pipeline::parse_family;

#[test]
fn decodes_plus_as_space_before_percent_decoding() {
    assert_eq!(
        decode_object_key("sondeos/Precios+05+al+11+de+marzo%2C+2018.pdf"),
        "sondeos/Precios 05 al 11 de marzo, 2018.pdf"
    );
    assert_eq!(decode_object_key("a%2Bb.pdf"), "a+b.pdf");
}

#[test]
fn keeps_keys_that_are_not_valid_percent_encoding() {
    assert_eq!(decode_object_key("precios%FF.pdf"), "precios%FF.pdf");
}

#[test]
fn recognizes_pdf_keys_case_insensitively() {
    assert!(is_pdf_key("uploads/precios.PDF"));
    assert!(!is_pdf_key("uploads/precios.csv"));
    assert!(!is_pdf_key("uploads/pdf"));
}

#[test]
fn lists_output_keys_per_family() {
    assert_eq!(
        output_keys("sondeos/farmacias junio.pdf", ReportFamily::Pharmacy),
        vec![
            (Channel::Single, "sondeos/farmacias junio.csv".to_string()),
            (Channel::Generic, "sondeos/farmacias junio-generic.csv".to_string()),
            (Channel::Commercial, "sondeos/farmacias junio-commercial.csv".to_string()),
        ]
    );
    assert_eq!(output_keys("precios.pdf", ReportFamily::Retail).len(), 1);
}

#[test]
fn parses_storage_event_notifications() {
    let body = r#"{
        "account": "3f4b7e3dcab231cbfdaa90a6a28bd548",
        "action": "PutObject",
        "bucket": "sondeos",
        "object": {"key": "precios+marzo.pdf", "size": 65536, "eTag": "c846ff7a18f28c2e262116d6e8719ef0"},
        "eventTime": "2018-03-12T14:00:00.000Z"
    }"#;

    let event = parse_event(body).expect("event should parse");
    assert_eq!(event.bucket, "sondeos");
    assert_eq!(event.object.key, "precios+marzo.pdf");
    assert_eq!(event.object.size, Some(65536));
    assert_eq!(event.action.as_deref(), Some("PutObject"));
    assert_eq!(event.event_time.as_deref(), Some("2018-03-12T14:00:00.000Z"));
}

#[test]
fn rejects_events_without_key() {
    let error = parse_event(r#"{"bucket": "sondeos", "object": {"key": " "}}"#)
        .expect_err("blank key should fail");
    assert_eq!(error.code(), "bad_request");

    let error = parse_event(r#"{"bucket": "sondeos"}"#).expect_err("missing object should fail");
    assert_eq!(error.status_code(), 400);
}

#[test]
fn serializes_conversion_response() {
    let response = ConversionResponse {
        bucket: "sondeos".to_string(),
        key: "precios.pdf".to_string(),
        family: ReportFamily::Retail.to_string(),
        status: ConversionStatus::Existing,
        outputs: vec!["precios.csv".to_string()],
        records: 0,
        processed_at: format_timestamp(0),
    };

    let json = serde_json::to_value(&response).expect("response should serialize");
    assert_eq!(json["status"], "existing");
    assert_eq!(json["family"], "retail");
    assert_eq!(json["processed_at"], "1970-01-01T00:00:00+00:00");
}

#[test]
fn parses_family_and_force_overrides() {
    assert_eq!(parse_family("b").expect("family should parse"), ReportFamily::Pharmacy);
    assert_eq!(parse_family("a").expect("family should parse"), ReportFamily::Retail);
    let error = parse_family("x").expect_err("unknown family should fail");
    assert_eq!(error.code(), "validation_error");

    assert!(parse_flag(" Yes "));
    assert!(parse_flag("1"));
    assert!(!parse_flag("no"));
}

#[test]
fn maps_conversion_errors_to_api_errors() {
    let error = ApiError::from(ConvertError::MalformedDate {
        year: 2018,
        month: 2,
        day: 30,
    });
    assert_eq!(error.status_code(), 422);
    assert!(!error.is_retryable());

    let error = ApiError::from(ConvertError::Io(std::io::Error::other("disk full")));
    assert_eq!(error.code(), "internal_error");
    assert!(error.is_retryable());
}
