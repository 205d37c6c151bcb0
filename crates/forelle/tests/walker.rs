//! Round-trip tests: interpret generated automata over concrete token
//! sequences and check the reconstructed parse trees.

use forelle::grammar::{nt, t, Grammar, NonTerminal};
use forelle::testing::{parse, token_sequence, ParseTree, WalkError};
use forelle::{generate, DecisionAutomaton, GenerateOptions, NoResolution};

fn automaton(grammar: Grammar) -> DecisionAutomaton {
    generate(grammar, &NoResolution, GenerateOptions::default()).expect("grammar generates")
}

fn start(automaton: &DecisionAutomaton, name: &str) -> NonTerminal {
    automaton.grammar().non_terminal(name).expect("known symbol")
}

fn run(automaton: &DecisionAutomaton, from: &str, input: &[&str]) -> Result<ParseTree, WalkError> {
    let tokens = token_sequence(automaton.grammar(), input).expect("known tokens");
    parse(automaton, start(automaton, from), &tokens)
}

#[test]
fn tiered_expressions_round_trip_right_associative() {
    let automaton = automaton(
        Grammar::builder()
            .rule("E", [nt("T")])
            .rule("E", [nt("T"), t("+"), nt("E")])
            .rule("T", [nt("F")])
            .rule("T", [nt("F"), t("*"), nt("T")])
            .rule("F", [t("Id")])
            .start_symbol("E")
            .build()
            .unwrap(),
    );

    let tree = run(&automaton, "E", &["Id", "+", "Id", "*", "Id"]).expect("input accepted");
    assert_eq!(
        tree.render(automaton.grammar()),
        "E(T(F(Id)) + E(T(F(Id) * T(F(Id)))))"
    );

    let tree = run(&automaton, "E", &["Id"]).expect("single atom accepted");
    assert_eq!(tree.render(automaton.grammar()), "E(T(F(Id)))");

    assert!(run(&automaton, "E", &["Id", "+"]).is_err());
    assert!(run(&automaton, "E", &["+", "Id"]).is_err());
}

#[test]
fn nullable_lifting_distinguishes_by_one_extra_token() {
    let automaton = automaton(
        Grammar::builder()
            .rule("A", [nt("B"), t(";")])
            .rule("B", [])
            .rule("B", [t(";")])
            .start_symbol("A")
            .build()
            .unwrap(),
    );

    let tree = run(&automaton, "A", &[";"]).expect("one separator accepted");
    assert_eq!(tree.render(automaton.grammar()), "A(B() ;)");

    let tree = run(&automaton, "A", &[";", ";"]).expect("two separators accepted");
    assert_eq!(tree.render(automaton.grammar()), "A(B(;) ;)");

    assert!(run(&automaton, "A", &[";", ";", ";"]).is_err());
    assert!(run(&automaton, "A", &[]).is_err());
}

#[test]
fn self_embedding_parens_nest_correctly() {
    let automaton = automaton(
        Grammar::builder()
            .rule("B", [t("("), nt("B"), t(")")])
            .rule("B", [])
            .start_symbol("B")
            .build()
            .unwrap(),
    );

    let tree = run(&automaton, "B", &["(", "(", ")", ")"]).expect("nested parens accepted");
    assert_eq!(tree.render(automaton.grammar()), "B(( B(( B() )) ))");

    let tree = run(&automaton, "B", &[]).expect("empty input accepted");
    assert_eq!(tree.render(automaton.grammar()), "B()");

    assert!(run(&automaton, "B", &["(", "(", ")"]).is_err());
    assert!(run(&automaton, "B", &[")"]).is_err());
}

#[test]
fn common_prefix_grammar_branches_after_the_shared_region() {
    let automaton = automaton(
        Grammar::builder()
            .rule("A", [t("Id"), nt("A"), nt("B"), t("+")])
            .rule("A", [t("Id"), nt("A"), nt("B"), t("-")])
            .rule("A", [t("*")])
            .rule("B", [t(";")])
            .start_symbol("A")
            .build()
            .unwrap(),
    );

    let plus = run(&automaton, "A", &["Id", "*", ";", "+"]).expect("plus arm accepted");
    assert_eq!(plus.render(automaton.grammar()), "A(Id A(*) B(;) +)");

    let minus = run(&automaton, "A", &["Id", "*", ";", "-"]).expect("minus arm accepted");
    assert_eq!(minus.render(automaton.grammar()), "A(Id A(*) B(;) -)");

    assert!(run(&automaton, "A", &["Id", "*", ";"]).is_err());
}

#[test]
fn discriminated_decisions_rebuild_the_real_tree() {
    let automaton = automaton(
        Grammar::builder()
            .rule("S", [t("a"), nt("X")])
            .rule("S", [t("a"), nt("Y")])
            .rule("X", [t("x"), t("z")])
            .rule("Y", [t("x"), t("w")])
            .start_symbol("S")
            .build()
            .unwrap(),
    );
    assert_eq!(automaton.grammar().discriminators().len(), 1);

    let via_x = run(&automaton, "S", &["a", "x", "z"]).expect("x arm accepted");
    assert_eq!(via_x.render(automaton.grammar()), "S(a X(x z))");

    let via_y = run(&automaton, "S", &["a", "x", "w"]).expect("y arm accepted");
    assert_eq!(via_y.render(automaton.grammar()), "S(a Y(x w))");

    assert!(run(&automaton, "S", &["a", "x"]).is_err());
}

#[test]
fn prefix_reused_discriminator_round_trips() {
    let automaton = automaton(
        Grammar::builder()
            .rule("S1", [t("a"), nt("X")])
            .rule("S1", [t("a"), nt("Y")])
            .rule("S2", [t("a"), nt("X"), t("k")])
            .rule("S2", [t("a"), nt("Y"), t("k")])
            .rule("X", [t("x"), t("z")])
            .rule("Y", [t("x"), t("w")])
            .start_symbol("S1")
            .start_symbol("S2")
            .build()
            .unwrap(),
    );
    assert_eq!(automaton.grammar().discriminators().len(), 1);

    let tree = run(&automaton, "S2", &["a", "x", "z", "k"]).expect("x arm accepted");
    assert_eq!(tree.render(automaton.grammar()), "S2(a X(x z) k)");

    let tree = run(&automaton, "S2", &["a", "x", "w", "k"]).expect("y arm accepted");
    assert_eq!(tree.render(automaton.grammar()), "S2(a Y(x w) k)");

    let tree = run(&automaton, "S1", &["a", "x", "z"]).expect("short form accepted");
    assert_eq!(tree.render(automaton.grammar()), "S1(a X(x z))");

    assert!(run(&automaton, "S2", &["a", "x", "z"]).is_err());
}

#[test]
fn rejection_reports_position_and_expectation() {
    let automaton = automaton(
        Grammar::builder()
            .rule("P", [t("a"), t("b")])
            .start_symbol("P")
            .build()
            .unwrap(),
    );

    let err = run(&automaton, "P", &["a", "a"]).unwrap_err();
    match err {
        WalkError::UnexpectedToken {
            position, found, ..
        } => {
            assert_eq!(position, 1);
            assert_eq!(found.as_deref(), Some("a"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
