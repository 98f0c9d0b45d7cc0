use mongodb::bson::{doc, Bson, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Sort key as understood by the store: negative means descending
    pub fn to_key(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// One aggregation stage. Only the stages the API actually uses are modelled.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Keep documents whose fields satisfy the filter
    Match(Document),
    Sort {
        field: String,
        direction: SortDirection,
    },
    /// Drop the named fields from the output shape
    Exclude(Vec<String>),
    /// Left-outer join: attach every document of `from` whose `foreign_field`
    /// equals this document's `local_field` as an array under `as_field`
    Lookup {
        from: String,
        local_field: String,
        foreign_field: String,
        as_field: String,
    },
    /// Set `field` to `prefix` followed by the string value of `source`
    Concat {
        field: String,
        prefix: String,
        source: String,
    },
}

impl Stage {
    pub fn to_document(&self) -> Document {
        match self {
            Stage::Match(filter) => doc! { "$match": filter.clone() },
            Stage::Sort { field, direction } => {
                let mut sort = Document::new();
                sort.insert(field.clone(), direction.to_key());
                doc! { "$sort": sort }
            }
            Stage::Exclude(fields) => {
                let mut project = Document::new();
                for field in fields {
                    project.insert(field.clone(), 0);
                }
                doc! { "$project": project }
            }
            Stage::Lookup {
                from,
                local_field,
                foreign_field,
                as_field,
            } => doc! {
                "$lookup": {
                    "from": from.clone(),
                    "localField": local_field.clone(),
                    "foreignField": foreign_field.clone(),
                    "as": as_field.clone(),
                }
            },
            Stage::Concat {
                field,
                prefix,
                source,
            } => {
                let mut fields = Document::new();
                fields.insert(
                    field.clone(),
                    doc! {
                        "$concat": [Bson::String(prefix.clone()), Bson::String(format!("${}", source))]
                    },
                );
                doc! { "$addFields": fields }
            }
        }
    }
}

/// Ordered list of stages, composed left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matching(mut self, filter: Document) -> Self {
        self.stages.push(Stage::Match(filter));
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.stages.push(Stage::Sort {
            field: field.into(),
            direction,
        });
        self
    }

    /// Newest first when sorting by `_id`
    pub fn sort_desc(self, field: impl Into<String>) -> Self {
        self.sort(field, SortDirection::Desc)
    }

    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stages
            .push(Stage::Exclude(fields.into_iter().map(Into::into).collect()));
        self
    }

    pub fn lookup(
        mut self,
        from: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
        as_field: impl Into<String>,
    ) -> Self {
        self.stages.push(Stage::Lookup {
            from: from.into(),
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
            as_field: as_field.into(),
        });
        self
    }

    pub fn concat(
        mut self,
        field: impl Into<String>,
        prefix: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        self.stages.push(Stage::Concat {
            field: field.into(),
            prefix: prefix.into(),
            source: source.into(),
        });
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Render as driver stages
    pub fn to_documents(&self) -> Vec<Document> {
        self.stages.iter().map(Stage::to_document).collect()
    }
}
