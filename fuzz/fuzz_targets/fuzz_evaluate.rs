//! Fuzz target for evaluation of arbitrary stored documents.
//!
//! Goal: evaluation is total. Any document that parses, against any context that
//! parses, yields a decision without panicking.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_evaluate
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use trustgate_domain::{EvaluationContext, Evaluator, PolicyDocument};

#[derive(Arbitrary, Debug)]
struct EvalInput {
    policy: String,
    context: String,
}

fuzz_target!(|input: EvalInput| {
    if input.policy.len() > 16 * 1024 || input.context.len() > 4 * 1024 {
        return;
    }
    let Ok(doc) = serde_json::from_str::<PolicyDocument>(&input.policy) else {
        return;
    };
    let Ok(ctx) = serde_json::from_str::<EvaluationContext>(&input.context) else {
        return;
    };

    let evaluator = Evaluator::default();
    let decision = evaluator.evaluate(&doc, &ctx);
    let _ = evaluator.simulate(&doc, &ctx);
    assert!(!decision.reason.is_empty());
});
