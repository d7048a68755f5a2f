// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
//! Prints every CRD as a multi-document YAML stream.

use anyhow::Result;
use provider_gitea::crd;

fn main() -> Result<()> {
    for definition in crd::all() {
        println!("---");
        print!("{}", serde_yaml::to_string(&definition)?);
    }
    Ok(())
}
