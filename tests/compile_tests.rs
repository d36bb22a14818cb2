use std::sync::Arc;
use std::thread;

use lexmap::{
    CompileWarning, Error, Matcher, Options, OutputMode, Rule, RuleSet, Sides, compile, compile_update, normalize_with,
    rule, standard_rules,
};

#[test]
fn rule_set_flattens_and_compiles() {
    let mut set = RuleSet::new();
    set.add(rule!(split "kappa", [LEFT, MIDDLE, RIGHT]));
    set.add(rule!(token "several words" => "word"));
    set.add(rule!(char 'y' => 'x'));

    assert_eq!(
        set.to_rule_lines(),
        "set\tcs\t0\ns\tlmr\tkappa\nr\tword\tseveral words\nc\tx\ty\n"
    );

    let matcher = compile(&set.to_rule_lines()).unwrap();
    let out = normalize_with(&matcher, "nfkappab several words y", &Options::default()).unwrap();
    assert_eq!(out.transformed, "nf kappa b word x");
}

#[test]
fn rule_set_retargets_replacements() {
    let mut set = RuleSet::new();
    set.add(rule!(token "bad" => "good"));
    set.add(rule!(token "worse" => "better"));
    set.remove(&rule!(token "bad" => "good"));
    assert_eq!(set.to_rule_lines(), "set\tcs\t0\nr\tbetter\tworse\n");

    set.add(rule!(token "worse" => "best"));
    assert_eq!(set.len(), 1);
    assert!(set.contains(&Rule::ReplaceToken { pattern: "worse".into(), target: "best".into() }));
}

#[test]
fn standard_rules_are_editable() {
    let mut set = standard_rules();
    assert_eq!(set.len(), 14);
    assert!(set.contains(&rule!(split "omega", [LEFT, MIDDLE, RIGHT])));

    set.remove(&rule!(split "kappa", [LEFT, MIDDLE, RIGHT]));
    let matcher = compile(&set.to_rule_lines()).unwrap();
    let out = normalize_with(&matcher, "nfkappab", &Options::default()).unwrap();
    assert_eq!(out.transformed, "nfkappab");
}

#[test]
fn comments_and_blank_lines_are_skipped() {
    let matcher = compile("# greek\n\nset\tcs\t0\n  # splits\ns\tlmr\tbeta\r\n").unwrap();
    let out = normalize_with(&matcher, "abetaz", &Options::default()).unwrap();
    assert_eq!(out.transformed, "a beta z");
    assert_eq!(out.forward_map, vec![0, 5, 1, 2, 3, 4, 5, 5]);
}

#[test]
fn malformed_lines_are_rejected() {
    let cases = [
        "r\tonly-two\n",
        "r\ta\tb\tc\n",
        "x\ta\tb\n",
        "c\tab\tc\n",
        "c\ta\t\n",
        "s\tlq\tword\n",
        "s\tlmr\t\n",
        "r\tsomething\t\n",
    ];
    for lines in cases {
        assert!(matches!(compile(lines), Err(Error::InvalidRule { .. })), "lines: {lines:?}");
    }
}

#[test]
fn cycles_and_conflicts_are_fatal() {
    match compile("r\tx\ty\nr\ty\tx\n") {
        Err(Error::CircularReference { pattern }) => assert_eq!(pattern, "x"),
        other => panic!("expected a circular reference, got {other:?}"),
    }

    match compile("r\ta\tx\nr\tb\tx\n") {
        Err(Error::ConflictingRule { pattern, targets }) => {
            assert_eq!(pattern, "x");
            assert_eq!(targets, vec!["a".to_string(), "b".to_string()]);
        }
        other => panic!("expected a conflict, got {other:?}"),
    }

    assert!(matches!(compile("c\tx\ty\nc\ty\tx\n"), Err(Error::CircularReference { .. })));
}

#[test]
fn conflicting_settings_warn_and_fall_back() {
    let matcher = compile("set\tcs\t1\nset\tcs\t0\nr\tword\tWORD\n").unwrap();
    assert_eq!(
        matcher.warnings(),
        &[CompileWarning::SettingConflict { setting: "cs".into(), values: vec!["0".into(), "1".into()] }]
    );
    assert!(!matcher.settings().case_sensitive);

    let out = normalize_with(&matcher, "Word", &Options::default()).unwrap();
    assert_eq!(out.transformed, "word");
}

#[test]
fn unknown_settings_are_ignored() {
    let matcher = compile("set\tlanguage\ten\n").unwrap();
    assert!(matcher.warnings().is_empty());
    assert_eq!(matcher.settings(), lexmap::Settings::default());
}

#[test]
fn failed_update_keeps_previous_rules() {
    let mut matcher = compile("set\tcs\t0\nr\ttransformed\toriginal\n").unwrap();
    let err = compile_update(&mut matcher, "c\tn\tt\nr\tp\tq\nr\tq\tp\n").unwrap_err();
    assert!(matches!(err, Error::CircularReference { .. }));

    let out = normalize_with(&matcher, "original string", &Options::default()).unwrap();
    assert_eq!(out.transformed, "transformed string");
}

#[test]
fn update_can_switch_settings() {
    let mut matcher = compile("set\tcs\t0\n").unwrap();
    compile_update(&mut matcher, "set\tbypass\t1\n").unwrap();
    assert!(matcher.settings().bypass);

    let options = Options { mode: OutputMode::Set, ..Options::default() };
    let out = normalize_with(&matcher, "b a b", &options).unwrap();
    assert_eq!(out.transformed, "b a b");
}

#[test]
fn scan_errors_leave_matcher_usable() {
    let matcher = compile("set\tcs\t0\ns\tlmr\tbeta\n").unwrap();

    let err = normalize_with(&matcher, "a\u{1F}beta", &Options::default()).unwrap_err();
    assert!(matches!(err, Error::ReservedCharacterCollision { ch: '\u{1F}', position: 1 }));

    let options = Options { separator: '#', control: '#', ..Options::default() };
    assert!(matches!(normalize_with(&matcher, "abetaz", &options), Err(Error::InvalidArgument(_))));

    let options = Options { control: '#', ..Options::default() };
    assert_eq!(normalize_with(&matcher, "abetaz", &options).unwrap().transformed, "a beta z");
}

#[test]
fn matcher_is_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Matcher>();

    let matcher = Arc::new(compile("set\tcs\t0\ns\tlmr\tkappa\n").unwrap());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let matcher = Arc::clone(&matcher);
            thread::spawn(move || normalize_with(&matcher, "nfkappab", &Options::default()).unwrap().transformed)
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), "nf kappa b");
    }
}

#[test]
fn sides_parse_from_letters() {
    assert_eq!(Sides::from_letters("mr"), Some(Sides::MIDDLE | Sides::RIGHT));
    assert_eq!(rule!(split "x", [RIGHT, LEFT]).to_line(), "s\tlr\tx\n");
}
