use anyhow::Result;
use permit_behavior::Action;
use permit_matcher::{allowed_to, ResourceCheck};
use permit_tests::{init_tracing, FailingEngine, RuleTable};

const NOTES: &str = "NotesController";

#[test]
fn fully_permitted_read_is_a_match() -> Result<()> {
    init_tracing();
    let engine = RuleTable::new().allow("viewer", NOTES, [Action::Index, Action::Show]);
    let resource = ResourceCheck::new(&engine, NOTES);

    let mut matcher = allowed_to("viewer").with_helper("to_read")?;
    assert!(matcher.matches(&resource)?);
    assert!(!matcher.does_not_match(&resource)?);
    Ok(())
}

#[test]
fn partial_permission_fails_both_polarities() -> Result<()> {
    init_tracing();
    let engine = RuleTable::new().allow("viewer", NOTES, [Action::Index]);
    let resource = ResourceCheck::new(&engine, NOTES);

    let mut matcher = allowed_to("viewer").with_helper("to_read")?;
    assert!(!matcher.matches(&resource)?);
    assert!(!matcher.does_not_match(&resource)?);
    Ok(())
}

#[test]
fn fully_denied_read_is_the_explicit_opposite() -> Result<()> {
    init_tracing();
    let engine = RuleTable::new();
    let resource = ResourceCheck::new(&engine, NOTES);

    let mut matcher = allowed_to("viewer").with_helper("to_read")?;
    assert!(!matcher.matches(&resource)?);
    assert!(matcher.does_not_match(&resource)?);
    Ok(())
}

#[test]
fn default_matcher_checks_exactly_index() -> Result<()> {
    init_tracing();
    // index is allowed but show is not; the default must only ask about
    // index for this to match.
    let engine = RuleTable::new().allow("viewer", NOTES, [Action::Index]);
    let resource = ResourceCheck::new(&engine, NOTES);

    let mut matcher = allowed_to("viewer");
    assert!(matcher.matches(&resource)?);
    Ok(())
}

#[test]
fn to_targets_a_single_action() -> Result<()> {
    init_tracing();
    let engine = RuleTable::new().allow("editor", NOTES, [Action::Update]);
    let resource = ResourceCheck::new(&engine, NOTES);

    assert!(allowed_to("editor").to(Action::Update).matches(&resource)?);
    assert!(allowed_to("editor").to(Action::Destroy).does_not_match(&resource)?);
    Ok(())
}

#[test]
fn only_to_read_requires_the_complement_denied() -> Result<()> {
    init_tracing();
    let reader = RuleTable::new().allow("viewer", NOTES, [Action::Index, Action::Show]);
    let resource = ResourceCheck::new(&reader, NOTES);
    assert!(allowed_to("viewer").with_helper("only_to_read")?.matches(&resource)?);

    // One write action leaking through turns the verdict mixed.
    let leaky = RuleTable::new().allow(
        "viewer",
        NOTES,
        [Action::Index, Action::Show, Action::Destroy],
    );
    let resource = ResourceCheck::new(&leaky, NOTES);
    let mut matcher = allowed_to("viewer").with_helper("only_to_read")?;
    assert!(!matcher.matches(&resource)?);
    assert!(!matcher.does_not_match(&resource)?);
    Ok(())
}

#[test]
fn except_to_delete_permits_everything_else() -> Result<()> {
    init_tracing();
    let engine = RuleTable::new().allow(
        "editor",
        NOTES,
        Action::ALL.into_iter().filter(|action| *action != Action::Destroy),
    );
    let resource = ResourceCheck::new(&engine, NOTES);

    let mut matcher = allowed_to("editor").with_helper("except_to_delete")?;
    assert!(matcher.matches(&resource)?);
    Ok(())
}

#[test]
fn unknown_helper_surfaces_before_any_check_runs() {
    init_tracing();
    let err = allowed_to("viewer").with_helper("to_explode").unwrap_err();
    assert_eq!(err.to_string(), "unknown permission helper `to_explode`");
}

#[test]
fn engine_failures_propagate_with_the_original_error() {
    init_tracing();
    let engine = FailingEngine;
    let resource = ResourceCheck::new(&engine, NOTES);

    let mut matcher = allowed_to("viewer").to(Action::Show);
    let err = matcher.matches(&resource).unwrap_err();
    assert!(err.to_string().contains("no rules loaded for viewer/show"));
}

#[test]
fn failure_text_is_diagnosable() -> Result<()> {
    init_tracing();
    let engine = RuleTable::new().allow("viewer", NOTES, [Action::Index]);
    let resource = ResourceCheck::new(&engine, NOTES);

    let mut matcher = allowed_to("viewer").with_helper("only_to_read")?;
    assert!(!matcher.matches(&resource)?);

    let message = matcher.failure_message();
    assert!(message.contains("role viewer"));
    assert!(message.contains("only to read"));
    assert!(message.contains(NOTES));
    assert!(message.contains(r#""index":true"#));
    assert!(message.contains(r#""show":false"#));
    // negated-set answers are reported too
    assert!(message.contains(r#""destroy":false"#));

    let negated = matcher.failure_message_when_negated();
    assert!(negated.starts_with("did not expect"));
    Ok(())
}

#[test]
fn description_reads_like_the_assertion() -> Result<()> {
    let matcher = allowed_to("sales").with_helper("only_to_manage")?;
    assert_eq!(
        matcher.description(),
        "be allowed only to manage as role sales"
    );
    Ok(())
}
