//! Integration tests: full simulate → aggregate → report pipeline.

mod simulation;
