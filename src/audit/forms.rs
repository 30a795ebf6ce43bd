use serde::Serialize;
use std::fmt::Write as _;

use super::dom::{attr, closest, has_attr, selector, Page};
use super::AuditError;

const GOOGLE_FORM_OR_FORM: &str =
    r#"form, iframe[src*="forms.google"], iframe[src*="docs.google.com/forms"]"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormEntry {
    Native {
        action: Option<String>,
        /// 1-based positions of unlabelled controls.
        unlabelled_inputs: Vec<usize>,
        /// 1-based positions of `required` controls lacking `aria-required`.
        missing_aria_required: Vec<usize>,
    },
    GoogleForm {
        has_title: bool,
    },
}

impl FormEntry {
    pub fn warnings(&self) -> usize {
        match self {
            FormEntry::Native { unlabelled_inputs, missing_aria_required, .. } => {
                unlabelled_inputs.len() + missing_aria_required.len()
            }
            FormEntry::GoogleForm { has_title } => usize::from(!has_title),
        }
    }
}

/// Structure of every form on the page, native or embedded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormReport {
    pub forms: Vec<FormEntry>,
}

impl FormReport {
    pub fn collect(page: &Page) -> Result<Self, AuditError> {
        let mut forms = Vec::new();

        for form in page.select(GOOGLE_FORM_OR_FORM)? {
            if form.value().name() == "iframe" {
                let has_title = attr(form, "title").is_some_and(|t| !t.trim().is_empty());
                forms.push(FormEntry::GoogleForm { has_title });
                continue;
            }

            let mut unlabelled_inputs = Vec::new();
            let mut missing_aria_required = Vec::new();
            let controls = selector("input, select, textarea")?;

            for (i, control) in form.select(&controls).enumerate() {
                let hidden =
                    attr(control, "type").is_some_and(|t| t.eq_ignore_ascii_case("hidden"));
                let labelled = attr(control, "id").is_some_and(|id| page.has_label_for(id))
                    || has_attr(control, "aria-label")
                    || closest(control, "label").is_some();

                if !labelled && !hidden {
                    unlabelled_inputs.push(i + 1);
                }
                if has_attr(control, "required") && !has_attr(control, "aria-required") {
                    missing_aria_required.push(i + 1);
                }
            }

            forms.push(FormEntry::Native {
                action: attr(form, "action").filter(|a| !a.trim().is_empty()).map(str::to_string),
                unlabelled_inputs,
                missing_aria_required,
            });
        }

        Ok(Self { forms })
    }

    pub fn warnings(&self) -> usize {
        if self.forms.is_empty() {
            return 1;
        }
        self.forms.iter().map(FormEntry::warnings).sum()
    }

    pub fn render(&self) -> String {
        let mut out = String::from("\n📝 FORM VALIDATION TEST\n\n");
        if self.forms.is_empty() {
            out.push_str("⚠️  No forms found on page\n");
            return out;
        }

        for (index, form) in self.forms.iter().enumerate() {
            match form {
                FormEntry::GoogleForm { has_title } => {
                    let _ = writeln!(out, "✅ Form {}: Google Form embed detected", index + 1);
                    if !has_title {
                        out.push_str("⚠️  Google Form iframe missing title attribute\n");
                    }
                }
                FormEntry::Native { action, unlabelled_inputs, missing_aria_required } => {
                    let action = action.as_deref().unwrap_or("No action");
                    let _ = writeln!(out, "📋 Form {}: {}", index + 1, action);
                    for n in unlabelled_inputs {
                        let _ = writeln!(out, "⚠️  Input {n} missing label");
                    }
                    for n in missing_aria_required {
                        let _ = writeln!(out, "⚠️  Required input {n} missing aria-required");
                    }
                }
            }
        }
        out
    }
}
