// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::{bail, Result};
use kcidb_orm::*;
use serde::{Deserialize, Serialize};
use std::env;
use test_generator::test_resources;

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
struct Case {
    pub note: String,
    pub pattern: String,
    pub id_lists: Option<Vec<ObjIdList>>,
    /// YAML schema description to use instead of the bundled one.
    pub schema: Option<String>,
    pub want_result: Option<Vec<String>>,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Test {
    cases: Vec<Case>,
}

fn run_case(case: &Case) -> Result<Vec<String>> {
    let schema = match &case.schema {
        Some(description) => Schema::new(serde_yaml::from_str(description)?)?,
        None => Schema::kcidb()?,
    };
    let pattern_list = Pattern::parse(&case.pattern, case.id_lists.as_deref(), &schema)?;

    let mut result = vec![];
    for pattern in &pattern_list {
        let formatted = pattern.format()?;
        // Inline ID lists must survive formatting
        if case.id_lists.is_none() {
            let reparsed = Pattern::parse(&formatted, None, &schema)?;
            assert_eq!(reparsed, vec![pattern.clone()], "round trip of {formatted}");
        }
        result.push(formatted);
    }
    Ok(result)
}

fn yaml_test_impl(file: &str) -> Result<()> {
    println!("\nrunning {}", file);

    let yaml = std::fs::read_to_string(file)?;
    let test: Test = serde_yaml::from_str(&yaml)?;

    for case in &test.cases {
        print!("case {} ", &case.note);

        match (run_case(case), &case.want_result, &case.error) {
            (Ok(actual), Some(expected), None) => {
                assert_eq!(&actual, expected, "pattern '{}'", case.pattern);
            }
            (Err(actual), None, Some(expected)) => {
                let actual = format!("{actual:#}");
                if !actual.contains(expected) {
                    bail!(
                        "Error message\n`{}\n`\ndoes not contain `{}`",
                        actual,
                        expected
                    );
                }
            }
            (Ok(actual), _, Some(_)) => {
                bail!("expected error, got {:?}", actual);
            }
            (Err(actual), _, None) => return Err(actual),
            _ => bail!("either want_result or error must be specified"),
        }

        println!("passed");
    }
    println!("{} cases passed.", test.cases.len());
    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{}", e);
        }
    }
}

#[test]
#[ignore = "intended for running a single case file"]
fn one_yaml() -> Result<()> {
    env_logger::init();

    let mut file = String::default();
    for a in env::args() {
        if a.ends_with(".yaml") {
            file = a;
            break;
        }
    }

    if file.is_empty() {
        bail!("missing yaml test file");
    }

    yaml_test(file.as_str())
}

#[test_resources("tests/pattern/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
