use medscribe::presentation::Environment;

#[test]
fn given_known_names_in_any_case_when_parsing_environment_then_variant_matches() {
    assert_eq!(Environment::try_from("LOCAL".to_string()), Ok(Environment::Local));
    assert_eq!(Environment::try_from("test".to_string()), Ok(Environment::Test));
    assert_eq!(Environment::try_from("production".to_string()), Ok(Environment::Prod));
}

#[test]
fn given_unknown_name_when_parsing_environment_then_error_lists_options() {
    let err = Environment::try_from("staging".to_string()).unwrap_err();

    assert!(err.contains("staging"));
    assert!(err.contains("local, test, or prod"));
}

#[test]
fn given_environment_when_displayed_then_matches_config_file_stem() {
    assert_eq!(Environment::Prod.to_string(), "prod");
    assert_eq!(Environment::default(), Environment::Local);
}
