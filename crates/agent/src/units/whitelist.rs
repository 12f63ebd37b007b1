// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Unit names the agent may act on.
///
/// A name is allowed when it is listed verbatim, or when it has the form
/// `<base>@<digits>.service` for a listed `base`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist {
    names: Vec<String>,
}

impl Whitelist {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self { names: names.into_iter().map(Into::into).collect() }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn allows(&self, name: &str) -> bool {
        self.names.iter().any(|entry| entry == name || is_instance_of(entry, name))
    }
}

fn is_instance_of(base: &str, name: &str) -> bool {
    name.strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('@'))
        .and_then(|rest| rest.strip_suffix(".service"))
        .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
#[path = "whitelist_tests.rs"]
mod tests;
