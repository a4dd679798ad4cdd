use serde_json::{json, Map, Value};

/// Structural description of the value a stage expects back from inference.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Text,
    Number,
    Enum(&'static [&'static str]),
    List(Box<Shape>),
    Object(Vec<Field>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub shape: Shape,
    pub description: Option<&'static str>,
}

impl Field {
    pub fn new(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            shape,
            description: None,
        }
    }

    pub fn described(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputContract {
    pub name: &'static str,
    pub shape: Shape,
}

impl OutputContract {
    pub fn new(name: &'static str, shape: Shape) -> Self {
        Self { name, shape }
    }

    pub fn list_of(name: &'static str, fields: Vec<Field>) -> Self {
        Self::new(name, Shape::List(Box::new(Shape::Object(fields))))
    }

    pub fn record(name: &'static str, fields: Vec<Field>) -> Self {
        Self::new(name, Shape::Object(fields))
    }

    /// JSON Schema rendering, handed to the model alongside the request.
    pub fn json_schema(&self) -> Value {
        shape_schema(&self.shape)
    }
}

fn shape_schema(shape: &Shape) -> Value {
    match shape {
        Shape::Text => json!({ "type": "string" }),
        Shape::Number => json!({ "type": "number" }),
        Shape::Enum(values) => json!({ "type": "string", "enum": values }),
        Shape::List(item) => json!({ "type": "array", "items": shape_schema(item) }),
        Shape::Object(fields) => {
            let mut properties = Map::new();
            for field in fields {
                let mut schema = shape_schema(&field.shape);
                if let (Some(description), Some(obj)) = (field.description, schema.as_object_mut())
                {
                    obj.insert("description".to_string(), json!(description));
                }
                properties.insert(field.name.to_string(), schema);
            }
            let required: Vec<&str> = fields.iter().map(|f| f.name).collect();
            json!({
                "type": "object",
                "properties": properties,
                "required": required,
                "additionalProperties": false
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_of_objects_renders_array_schema() {
        let contract = OutputContract::list_of(
            "requirements",
            vec![
                Field::new("question", Shape::Text).described("Yes/No question for the skill."),
                Field::new("priority", Shape::Enum(&["Core", "Preferred"])),
            ],
        );

        let schema = contract.json_schema();
        assert_eq!(schema["type"], "array");
        assert_eq!(schema["items"]["type"], "object");
        assert_eq!(
            schema["items"]["properties"]["priority"]["enum"],
            json!(["Core", "Preferred"])
        );
        assert_eq!(
            schema["items"]["properties"]["question"]["description"],
            "Yes/No question for the skill."
        );
        assert_eq!(schema["items"]["required"], json!(["question", "priority"]));
    }

    #[test]
    fn test_record_with_nested_list() {
        let contract = OutputContract::record(
            "profile",
            vec![Field::new("stack", Shape::List(Box::new(Shape::Text)))],
        );
        let schema = contract.json_schema();
        assert_eq!(schema["properties"]["stack"]["type"], "array");
        assert_eq!(schema["properties"]["stack"]["items"]["type"], "string");
        assert_eq!(schema["additionalProperties"], false);
    }
}
