use rstest::rstest;
use timeline_md::entry::parse_datetime;

#[rstest]
#[case("", None, false)]
#[case("ongoing", None, false)]
#[case("2023-05-01", Some("2023-05-01"), false)]
#[case("~2023-05-01", Some("2023-05-01"), true)]
#[case("2023-05-01 10:00:00", Some("2023-05-01 10:00:00"), false)]
#[case("~2023-05-01 10:00", Some("2023-05-01 10:00:00"), true)]
#[case("1999-12-31 23:59:59", Some("1999-12-31 23:59:59"), false)]
fn parses_date_cells(#[case] input: &str, #[case] expected: Option<&str>, #[case] approx: bool) {
    let (date, is_approx) = parse_datetime(input).unwrap();
    assert_eq!(expected.map(str::to_string), date.map(|d| d.to_string()));
    assert_eq!(approx, is_approx);
}

#[rstest]
#[case("~")]
#[case("~ongoing")]
#[case("2023/05/01")]
#[case("2023-05-01T10:00:00")]
#[case("2023-05-01 10")]
#[case("2023-05-01 25:00")]
#[case("unknown")]
fn rejects_malformed_dates(#[case] input: &str) {
    assert!(parse_datetime(input).is_err(), "{input:?} should not parse");
}
