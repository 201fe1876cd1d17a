#![allow(non_snake_case)]
use RustedPMP::Examples::ocp_examples::ocp_examples;
use RustedPMP::Examples::symbolic_examples::sym_examples;

fn main() {
    let example = 1;
    match example {
        0 => sym_examples(3),
        1 => ocp_examples(1),
        2 => ocp_examples(3),
        _ => ocp_examples(4),
    }
}
