//! Benchmark smoke harness for `cipherdesk`; tests live under `tests/`.
