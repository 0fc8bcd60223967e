//! Pre-build validation of act package input.
//!
//! Rules run over the full [`ActInputData`] and report every problem at
//! once. The API answers a failed validation with status 441 and the
//! collected errors as details.

use serde::Serialize;

use crate::input::{ActInputData, PublicationObject};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationObject {
    pub code: String,
    pub object_id: i64,
    pub object_type: String,
    pub title: String,
}

impl From<&PublicationObject> for ValidationObject {
    fn from(o: &PublicationObject) -> Self {
        Self {
            code: o.code.clone(),
            object_id: o.object_id,
            object_type: o.object_type.clone(),
            title: o.title.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub rule: String,
    pub object: Option<ValidationObject>,
    pub messages: Vec<String>,
}

pub trait ValidationRule: Send + Sync {
    fn validate(&self, input: &ActInputData) -> Vec<ValidationError>;
}

/// Every object handed to the package must be placed by the template.
pub struct UsedObjectsExistRule;

impl ValidationRule for UsedObjectsExistRule {
    fn validate(&self, input: &ActInputData) -> Vec<ValidationError> {
        let data = &input.publication_data;
        data.objects
            .iter()
            .filter(|o| {
                !matches!(o.object_type.as_str(), "werkingsgebied" | "document")
                    && !data.used_object_codes.contains(&o.code)
            })
            .map(|o| ValidationError {
                rule: "used_objects_exist_rule".into(),
                object: Some(o.into()),
                messages: vec![format!("{} can't be found in codes used in template", o.code)],
            })
            .collect()
    }
}

/// Used objects need a title to render a heading.
pub struct RequiredObjectFieldsRule;

impl ValidationRule for RequiredObjectFieldsRule {
    fn validate(&self, input: &ActInputData) -> Vec<ValidationError> {
        let data = &input.publication_data;
        data.objects
            .iter()
            .filter(|o| data.used_object_codes.contains(&o.code) && o.title.trim().is_empty())
            .map(|o| ValidationError {
                rule: "required_object_fields_rule".into(),
                object: Some(o.into()),
                messages: vec![format!("{} is missing required field title", o.code)],
            })
            .collect()
    }
}

pub struct ValidatePublicationService {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidatePublicationService {
    pub fn new(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        Self { rules }
    }

    pub fn validate(&self, input: &ActInputData) -> Vec<ValidationError> {
        self.rules.iter().flat_map(|r| r.validate(input)).collect()
    }
}

impl Default for ValidatePublicationService {
    fn default() -> Self {
        Self::new(vec![
            Box::new(UsedObjectsExistRule),
            Box::new(RequiredObjectFieldsRule),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{act_input, publication_object};

    #[test]
    fn clean_input_passes() {
        let mut input = act_input();
        input.publication_data.objects = vec![publication_object("beleidskeuze-1", 1)];
        input.publication_data.used_object_codes = ["beleidskeuze-1".to_string()].into();
        assert!(ValidatePublicationService::default().validate(&input).is_empty());
    }

    #[test]
    fn object_not_in_template_is_reported() {
        let mut input = act_input();
        input.publication_data.objects = vec![
            publication_object("beleidskeuze-1", 1),
            publication_object("beleidskeuze-2", 2),
        ];
        input.publication_data.used_object_codes = ["beleidskeuze-1".to_string()].into();

        let errors = ValidatePublicationService::default().validate(&input);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "used_objects_exist_rule");
        assert_eq!(
            errors[0].messages,
            vec!["beleidskeuze-2 can't be found in codes used in template".to_string()]
        );
    }

    #[test]
    fn werkingsgebieden_need_no_template_placement() {
        let mut input = act_input();
        let mut area = publication_object("werkingsgebied-9", 9);
        area.object_type = "werkingsgebied".into();
        input.publication_data.objects = vec![area];
        assert!(UsedObjectsExistRule.validate(&input).is_empty());
    }

    #[test]
    fn blank_title_is_reported() {
        let mut input = act_input();
        let mut object = publication_object("beleidskeuze-1", 1);
        object.title = "  ".into();
        input.publication_data.objects = vec![object];
        input.publication_data.used_object_codes = ["beleidskeuze-1".to_string()].into();

        let errors = ValidatePublicationService::default().validate(&input);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "required_object_fields_rule");
        assert_eq!(errors[0].object.as_ref().map(|o| o.object_id), Some(1));
    }
}
