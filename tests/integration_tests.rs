//! Integration tests for the translator
//!
//! These tests drive the complete pipeline from table text to output lines.

use pretty_assertions::assert_eq;
use pseudomap::{
    split_fields, strip_trailing_fields, translate_value, Driver, PseudomapError, RenderOptions,
    RowReader, Summary,
};

/// Helper to translate one expression to its wrapped rendering
fn render(source: &str) -> String {
    translate_value(source, &RenderOptions::default())
        .unwrap()
        .fragment
        .text
}

/// Helper to run a whole table through the driver
fn run_table(input: &str) -> (String, String, Summary) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let summary = {
        let mut driver = Driver::new(&mut out, &mut err);
        driver.run(input.as_bytes()).unwrap()
    };
    (
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
        summary,
    )
}

fn unwrap_quotes(text: &str) -> &str {
    &text[1..text.len() - 1]
}

#[test]
fn test_simple_ternaries() {
    let cases = [
        ("c ? a : b", "c", "a", "b"),
        ("x.y == 2 ? f(x) : 'none'", "x.y==2", "f(x)", "'none'"),
        ("a && b ? p.q[1] : r + s", "a and b", "p.q[1]", "r+s"),
        ("ok ? new Date(d) : _.d", "ok", "new Date(d)", "d"),
    ];

    for (source, cond, then_branch, else_branch) in cases {
        assert_eq!(
            render(source),
            format!(
                "\"if {} display {}\notherwise display {}\"",
                cond, then_branch, else_branch
            ),
            "source: {}",
            source
        );
    }
}

#[test]
fn test_bool_chain_words() {
    assert_eq!(
        render("a && b ? x : y"),
        "\"if a and b display x\notherwise display y\""
    );
    assert_eq!(
        render("a || b && c || d != 1 ? x : y"),
        "\"if a or b and c or d!=1 display x\notherwise display y\""
    );
}

#[test]
fn test_rendering_is_stable_for_plain_terms() {
    let sources = [
        "a.b?.c + d",
        "fmt(a.b, 'x', 3)",
        "new Date(x).year",
        "items[0].name",
        "(a.b).c",
        "_.name",
        "'abc'[2]",
        "now()",
        "fmt(\"\"x\"\", a)",
        "\"\"abc\"\"[0] + code",
    ];

    for source in sources {
        let first = render(source);
        let second = render(unwrap_quotes(&first));
        assert_eq!(first, second, "source: {}", source);
    }
}

#[test]
fn test_escaped_literal_survives_once() {
    let out = render("kind == \"\"Primary\"\" ? \"\"P\"\" : \"\"O\"\"");
    assert_eq!(
        out,
        "\"if kind==\"\"Primary\"\" display \"\"P\"\"\notherwise display \"\"O\"\"\""
    );
    // The output field is CSV-quoted, so each doubled quote reads back as one.
    assert!(!out.contains("\"\"\"Primary"));
    assert_eq!(out.matches("Primary").count(), 1);
}

#[test]
fn test_row_reconstruction() {
    let row = "file,type,namespace,path,\"(a && b)\",,,,,,,,";
    let payload = strip_trailing_fields(row).unwrap();
    let fields = split_fields(payload).unwrap();
    assert_eq!(
        [fields.file, fields.kind, fields.namespace, fields.path, fields.value].join(","),
        "file,type,namespace,path,(a && b)"
    );
}

#[test]
fn test_multi_line_row() {
    let input = "FOO,Bar,ns,path.x,\"cond ?\nval1 : val2\",,,,,,,,\n";
    let rows: Vec<_> = RowReader::new(input.as_bytes()).collect();
    assert_eq!(rows.len(), 1);

    let (out, err, summary) = run_table(input);
    assert_eq!(
        out,
        "1,FOO,Bar,ns,path.x,\"if cond display val1\notherwise display val2\"\n"
    );
    assert_eq!(err, "");
    assert_eq!(summary.succeeded, 1);
}

#[test]
fn test_nested_then_branch() {
    assert_eq!(
        render("a ? (b ? c : d) : e"),
        "\"if a\n\tif b display c\n\totherwise display d\notherwise display e\""
    );
}

#[test]
fn test_nested_else_branch_options() {
    let source = "a ? b : c ? d : e";
    assert_eq!(
        render(source),
        "\"if a display b\notherwise if c display d\notherwise display e\""
    );

    let options = RenderOptions {
        indent_else_branches: true,
    };
    let indented = translate_value(source, &options).unwrap().fragment.text;
    assert_eq!(
        indented,
        "\"if a display b\notherwise\n\tif c display d\n\totherwise display e\""
    );
}

#[test]
fn test_missing_branch_is_reported() {
    let err = translate_value("a ? b", &RenderOptions::default()).unwrap_err();
    assert!(err.is_parse_failure());

    let (out, err, summary) = run_table("F,T,N,p,\"a ? b\",,,,,,,,\n");
    assert_eq!(out, "");
    assert_eq!(err, "!!! 1,F,T,N,p,\"a ? b\",,,,,,,,\n");
    assert_eq!(
        summary,
        Summary {
            succeeded: 0,
            failed: 1
        }
    );
}

#[test]
fn test_header_is_skipped() {
    let input = "\"File\",\"Type\",\"Namespace\",\"Path\",\"Value\"\nF,T,N,p,a.b,,,,,,,,\n";
    let (out, err, summary) = run_table(input);
    assert_eq!(out, "1,F,T,N,p,\"a.b\"\n");
    assert_eq!(err, "");
    assert_eq!(summary.failed + summary.succeeded, 1);
}

#[test]
fn test_mixed_table() {
    let input = "\
\"File\",\"Type\",\"Namespace\",\"Path\",\"Value\",\"a\",\"b\",\"c\",\"d\",\"e\",\"f\",\"g\",\"h\"
Patient,Person,pat,name[0].given,\"first + ' ' + last\",,,,,,,,
Patient,Person,pat,gender,\"sex == \"\"M\"\" ? \"\"male\"\" :
  sex == \"\"F\"\" ? \"\"female\"\" : \"\"unknown\"\"\",note,,,,,,,
Patient,Person,pat,telecom[system@kind:phone].value,\"phone ?\",,,,,,,,
too,few,fields,,,
Patient,Person,pat,birthDate,\"toDate(dob, 'yyyyMMdd')\",,,,,,,,
";
    let (out, err, summary) = run_table(input);

    assert_eq!(
        out,
        "1,Patient,Person,pat,name[0].given,\"first+' '+last\"\n\
         2,Patient,Person,pat,gender,\"if sex==\"\"M\"\" display \"\"male\"\"\notherwise if sex==\"\"F\"\" display \"\"female\"\"\notherwise display \"\"unknown\"\"\"\n\
         5,Patient,Person,pat,birthDate,\"toDate(dob,'yyyyMMdd')\"\n"
    );
    assert_eq!(
        err,
        "!!! 3,Patient,Person,pat,telecom[system@kind:phone].value,\"phone ?\",,,,,,,,\n\
         !!! 4,too,few,fields,,,\n"
    );
    assert_eq!(
        summary,
        Summary {
            succeeded: 3,
            failed: 2
        }
    );
}

#[test]
fn test_illegal_characters_do_not_fail_rows() {
    let translation = translate_value("a $ ? b : c", &RenderOptions::default()).unwrap();
    assert_eq!(
        translation.fragment.text,
        "\"if a display b\notherwise display c\""
    );
    assert_eq!(translation.diagnostics.len(), 1);
    assert!(matches!(
        translation.diagnostics[0],
        PseudomapError::IllegalCharacter { ch: '$', .. }
    ));
}

#[test]
fn test_incomplete_last_row_is_counted() {
    let (out, err, summary) = run_table("F,T,N,p,v,,,,,,,,\nF,T,N,p,\"a ?\nb");
    assert_eq!(out, "1,F,T,N,p,\"v\"\n");
    assert_eq!(err, "!!! 2,F,T,N,p,\"a ?b\n");
    assert_eq!(summary.failed, 1);
}
