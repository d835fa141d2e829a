#[macro_use]
extern crate error_chain;

pub mod bmc;
pub mod btor2;
pub mod cex;
pub mod environment;
pub mod expr;
pub mod lir;
pub mod model;
pub mod solver;
pub mod stimulus;
pub mod synth;
pub mod util;
pub mod validate;

pub mod error {
    error_chain! {
        types {
            Error, ErrorKind, ResultExt, Result;
        }

        foreign_links {
            ParseBigIntError(::num_bigint::ParseBigIntError);
            RSmt2(::rsmt2::errors::Error);
            IOError(::std::io::Error);
            SerdeYAML(::serde_yaml::Error);
        }

        errors {
            Btor2Parse(line: usize, reason: crate::btor2::Btor2ParseReason) {
                description("malformed BTOR2 input")
                display("btor2:{}: {}", line, reason)
            }
            ScriptParse(line: usize, reason: String) {
                description("malformed stimulus script")
                display("stimulus:{}: {}", line, reason)
            }
            Binding(m: String) {
                description("stimulus script refers to an unknown signal")
                display("binding error: {}", m)
            }
            Backend(m: String) {
                description("SMT backend error")
                display("backend error: {}", m)
            }
            Sort {
                description("Sort error")
                display("Sort error, bits differ incorrectly")
            }
        }
    }
}
