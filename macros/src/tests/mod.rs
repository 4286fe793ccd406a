//! Unit tests for the body compiler and the attribute expansions
