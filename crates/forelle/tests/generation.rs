//! End-to-end generation properties: determinism, termination, conflict
//! reporting, and discriminator reuse.

use forelle::engine::{DiscriminatorContext, DiscriminatorMode};
use forelle::grammar::{nt, t};
use forelle::{generate, GenerateOptions, Grammar, NoResolution, PreferredRules};

fn tiered_expression_grammar() -> Grammar {
    Grammar::builder()
        .rule("E", [nt("T")])
        .rule("E", [nt("T"), t("+"), nt("E")])
        .rule("T", [nt("F")])
        .rule("T", [nt("F"), t("*"), nt("T")])
        .rule("F", [t("Id")])
        .start_symbol("E")
        .build()
        .expect("grammar builds")
}

#[test]
fn generation_is_deterministic() {
    let first = generate(
        tiered_expression_grammar(),
        &NoResolution,
        GenerateOptions::default(),
    )
    .expect("expression grammar generates");
    let second = generate(
        tiered_expression_grammar(),
        &NoResolution,
        GenerateOptions::default(),
    )
    .expect("expression grammar generates");

    assert_eq!(first.len(), second.len());
    assert_eq!(first.roots().len(), second.roots().len());
}

#[test]
fn failure_diagnostics_are_deterministic() {
    let build = || {
        Grammar::builder()
            .rule("S", [nt("Foo")])
            .rule("S", [nt("Bar")])
            .rule("Foo", [t("Id")])
            .rule("Bar", [t("Id")])
            .start_symbol("S")
            .build()
            .unwrap()
    };
    let first = generate(build(), &NoResolution, GenerateOptions::default()).unwrap_err();
    let second = generate(build(), &NoResolution, GenerateOptions::default()).unwrap_err();
    assert_eq!(first.messages(), second.messages());
    assert_eq!(first.messages().len(), 1);
}

#[test]
fn self_embedding_grammar_terminates_and_generates() {
    let grammar = Grammar::builder()
        .rule("B", [t("("), nt("B"), t(")")])
        .rule("B", [])
        .start_symbol("B")
        .build()
        .unwrap();
    let automaton = generate(grammar, &NoResolution, GenerateOptions::default())
        .expect("balanced-parens grammar is deterministic");
    assert!(!automaton.is_empty());
}

#[test]
fn common_prefix_is_factored_without_discriminators() {
    let grammar = Grammar::builder()
        .rule("A", [t("Id"), nt("A"), nt("B"), t("+")])
        .rule("A", [t("Id"), nt("A"), nt("B"), t("-")])
        .rule("A", [t("*")])
        .rule("B", [t(";")])
        .start_symbol("A")
        .build()
        .unwrap();
    let automaton = generate(grammar, &NoResolution, GenerateOptions::default())
        .expect("common-prefix grammar generates");
    assert!(automaton.grammar().discriminators().is_empty());
}

#[test]
fn overlapping_decision_points_share_one_discriminator() {
    let grammar = Grammar::builder()
        .rule("S1", [t("a"), nt("X")])
        .rule("S1", [t("a"), nt("Y")])
        .rule("S2", [t("a"), nt("X")])
        .rule("S2", [t("a"), nt("Y")])
        .rule("X", [t("x"), t("z")])
        .rule("Y", [t("x"), t("w")])
        .start_symbol("S1")
        .start_symbol("S2")
        .build()
        .unwrap();
    let automaton = generate(grammar, &NoResolution, GenerateOptions::default())
        .expect("discriminated grammar generates");
    assert_eq!(automaton.grammar().discriminators().len(), 1);
}

#[test]
fn prefix_reuse_is_recorded_on_the_shared_discriminator() {
    let grammar = Grammar::builder()
        .rule("S1", [t("a"), nt("X")])
        .rule("S1", [t("a"), nt("Y")])
        .rule("S2", [t("a"), nt("X"), t("k")])
        .rule("S2", [t("a"), nt("Y"), t("k")])
        .rule("X", [t("x"), t("z")])
        .rule("Y", [t("x"), t("w")])
        .start_symbol("S1")
        .start_symbol("S2")
        .build()
        .unwrap();
    let automaton = generate(grammar, &NoResolution, GenerateOptions::default())
        .expect("both start symbols generate");
    let grammar = automaton.grammar();
    let discriminators = grammar.discriminators();
    assert_eq!(discriminators.len(), 1);

    let usages: Vec<&DiscriminatorContext> = grammar
        .rules_for(discriminators[0])
        .iter()
        .flat_map(|rule| automaton.discriminator_usages(*rule))
        .collect();
    let s1 = grammar.non_terminal("S1").unwrap();
    let s2 = grammar.non_terminal("S2").unwrap();
    // Synthesized for the S1 decision (full continuations), then reused as
    // a prefix recognizer for the longer S2 continuations.
    assert!(usages.iter().any(|u| {
        u.mode == DiscriminatorMode::PostToken && grammar.rule(u.original_rule).produced() == s1
    }));
    assert!(usages.iter().any(|u| {
        u.mode == DiscriminatorMode::Prefix && grammar.rule(u.original_rule).produced() == s2
    }));
}

#[test]
fn preferred_rules_settle_reduce_reduce_conflicts() {
    let grammar = Grammar::builder()
        .rule("S", [nt("Foo")])
        .rule("S", [nt("Bar")])
        .rule("Foo", [t("Id")])
        .rule("Bar", [t("Id")])
        .start_symbol("S")
        .build()
        .unwrap();
    let s = grammar.non_terminal("S").unwrap();
    let preferred = PreferredRules::new(grammar.rules_for(s).to_vec());
    generate(grammar, &preferred, GenerateOptions::default())
        .expect("preference resolves the ambiguity");
}

#[test]
fn expansion_cap_reports_instead_of_diverging() {
    let grammar = Grammar::builder()
        .rule("S", [nt("Foo")])
        .rule("S", [nt("Bar")])
        .rule("Foo", [t("Id")])
        .rule("Bar", [t("Id")])
        .start_symbol("S")
        .build()
        .unwrap();
    let options = GenerateOptions {
        expansion_cap: 0,
        ..GenerateOptions::default()
    };
    let err = generate(grammar, &NoResolution, options).unwrap_err();
    assert!(!err.messages().is_empty());
}

#[test]
fn unresolved_decision_points_render_the_competing_parses() {
    let grammar = Grammar::builder()
        .rule("S", [nt("Foo")])
        .rule("S", [nt("Bar")])
        .rule("Foo", [t("Id")])
        .rule("Bar", [t("Id")])
        .start_symbol("S")
        .build()
        .unwrap();
    let err = generate(grammar, &NoResolution, GenerateOptions::default()).unwrap_err();
    let message = &err.messages()[0];
    assert!(message.contains("Foo"));
    assert!(message.contains("Bar"));
}
