// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Static files added to every generated repository.

/// Path of the GitHub Pages deployment workflow.
pub const PAGES_WORKFLOW_PATH: &str = ".github/workflows/pages.yml";

const MIT_LICENSE: &str = r#"MIT License

Copyright (c) 2025

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.
"#;

const PAGES_WORKFLOW: &str = r#"name: Deploy Pages
on:
  push:
    branches: [ main ]
permissions:
  contents: read
  pages: write
  id-token: write
concurrency:
  group: "pages"
  cancel-in-progress: true
jobs:
  deploy:
    environment:
      name: github-pages
      url: ${{ steps.deployment.outputs.page_url }}
    runs-on: ubuntu-latest
    steps:
      - name: Checkout
        uses: actions/checkout@v4
      - name: Setup Pages
        uses: actions/configure-pages@v4
      - name: Upload artifact
        uses: actions/upload-pages-artifact@v3
        with:
          path: .
      - name: Deploy to GitHub Pages
        id: deployment
        uses: actions/deploy-pages@v4
"#;

pub fn mit_license_text() -> &'static str {
    MIT_LICENSE
}

/// Actions workflow that publishes the repository root to Pages on push to `main`.
pub fn pages_workflow() -> &'static str {
    PAGES_WORKFLOW
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn license_is_mit() {
        assert!(mit_license_text().starts_with("MIT License"));
        assert!(mit_license_text().contains("WITHOUT WARRANTY OF ANY KIND"));
    }

    #[test]
    fn workflow_deploys_main_branch() {
        let wf = pages_workflow();
        assert!(wf.contains("branches: [ main ]"));
        assert!(wf.contains("actions/deploy-pages@v4"));
        assert!(wf.contains("${{ steps.deployment.outputs.page_url }}"));
    }
}
