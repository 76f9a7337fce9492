//! Contract test harness for `cipherdesk`; tests live under `tests/`.
