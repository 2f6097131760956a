use gscript::testing::{
    condition_registry, effect_registry, modifier_registry, TestScope,
};
use gscript::{Condition, Context, Factor, Fixed, MeanTimeToHappen, UniformClock};

#[test]
fn composite_conditions_from_script() {
    let registry = condition_registry();
    let block = gstxt::parse_text(
        r#"
        gold_at_least = 5
        or = {
            has_trait = brave
            has_trait = reckless
        }
        not = { opinion_of = { who = ROM value = 0 } }
        "#,
    )
    .expect("parse");
    let condition = registry.build_block(&block).expect("build");

    let mut scope = TestScope::with_traits(&["reckless"]);
    scope.gold = Fixed::from_int(8);
    scope.opinions.insert("ROM".to_string(), -20);
    assert!(condition.evaluate(&scope));

    scope.opinions.insert("ROM".to_string(), 10);
    assert!(!condition.evaluate(&scope), "negated branch now fails");

    // evaluate is pure
    let before = scope.clone();
    condition.evaluate(&scope);
    assert_eq!(scope, before);
}

#[test]
fn descriptions_mirror_structure() {
    let registry = condition_registry();
    let block = gstxt::parse_text("not = { has_trait = craven }").expect("parse");
    let condition = registry.build_block(&block).expect("build");
    assert_eq!(
        condition.describe(&TestScope::default()),
        "Not: Has the craven trait"
    );
}

#[test]
fn effects_mutate_scope_and_context() {
    let conditions = condition_registry();
    let effects = effect_registry();
    let block = gstxt::parse_text(
        r#"
        gain_gold = 3
        select_target = AQUITAINE
        if = {
            conditions = { has_trait = generous }
            gain_gold = 100
        }
        set_opinion = { who = ROM value = 25 }
        "#,
    )
    .expect("parse");
    let list = effects.build_list(&block, &conditions).expect("build");

    let mut scope = TestScope::default();
    let mut ctx = Context::new();
    list.apply(&mut scope, &mut ctx);

    assert_eq!(scope.gold, Fixed::from_int(3), "guarded gold skipped");
    assert_eq!(scope.opinion_of("ROM"), 25);
    assert_eq!(ctx.target(), Some("AQUITAINE"));
}

#[test]
fn modifiers_round_trip_through_scope_state() {
    let registry = modifier_registry();
    let block = gstxt::parse_text(
        "prosperity = {\n\tgold_income = 0.25\n\tstability = -1\n}",
    )
    .expect("parse");
    let modifier = registry.build(&block.children[0]).expect("build");
    assert_eq!(modifier.name, "prosperity");

    let mut scope = TestScope::default();
    modifier.apply(&mut scope, 2);
    assert_eq!(scope.gold_income, Fixed::HALF);
    assert_eq!(scope.stability, Fixed::from_int(-2));

    modifier.remove(&mut scope, 2);
    assert_eq!(scope, TestScope::default());

    assert_eq!(
        modifier.get_string(2, 1),
        "\tGold income: +0.50\n\tStability: -2.00\n"
    );
}

#[test]
fn factor_weights_react_to_scope() {
    let conditions = condition_registry();
    let block = gstxt::parse_text(
        r#"
        factor = {
            base = 2
            modifier = {
                add = 6
                has_trait = ambitious
            }
        }
        "#,
    )
    .expect("parse");
    let factor = Factor::from_block(&block.children[0], &conditions).expect("build");

    assert_eq!(factor.calculate(&TestScope::default()), Fixed::from_int(2));
    assert_eq!(
        factor.calculate(&TestScope::with_traits(&["ambitious"])),
        Fixed::from_int(8)
    );
}

#[test]
fn mtth_scales_with_factor_and_clock() {
    let conditions = condition_registry();
    let block = gstxt::parse_text(
        r#"
        mtth = {
            years = 2
            factor = {
                base = 1
                modifier = {
                    add = 1
                    has_trait = cautious
                }
            }
        }
        "#,
    )
    .expect("parse");
    let mtth =
        MeanTimeToHappen::from_block(&block.children[0], &conditions).expect("build");
    let clock = UniformClock {
        turns_per_month: Fixed::ONE,
    };

    let turns = mtth
        .calculate(&TestScope::default(), 450, &clock)
        .expect("calculate");
    assert_eq!(turns, Fixed::from_int(24));

    let turns = mtth
        .calculate(&TestScope::with_traits(&["cautious"]), 450, &clock)
        .expect("calculate");
    assert_eq!(turns, Fixed::from_int(48), "doubled factor doubles the wait");
}
