use serde::Deserialize;

use crate::error::PipelineError;

pub trait Classifier: Send + Sync {
    fn kind(&self) -> &'static str;

    fn predict_proba(&self, row: &[f64]) -> Result<f64, PipelineError>;

    fn threshold(&self) -> f64 {
        0.5
    }

    fn check_width(&self, width: usize) -> Result<(), String>;

    fn label(&self, probability: f64) -> u8 {
        u8::from(probability >= self.threshold())
    }
}

fn default_threshold() -> f64 {
    0.5
}

pub fn sigmoid(margin: f64) -> f64 {
    if margin >= 0.0 {
        1.0 / (1.0 + (-margin).exp())
    } else {
        let e = margin.exp();
        e / (1.0 + e)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    GradientBoostedTrees(TreeEnsemble),
    LogisticRegression(LogisticModel),
}

impl ModelArtifact {
    fn inner(&self) -> &dyn Classifier {
        match self {
            ModelArtifact::GradientBoostedTrees(model) => model,
            ModelArtifact::LogisticRegression(model) => model,
        }
    }
}

impl Classifier for ModelArtifact {
    fn kind(&self) -> &'static str {
        self.inner().kind()
    }

    fn predict_proba(&self, row: &[f64]) -> Result<f64, PipelineError> {
        self.inner().predict_proba(row)
    }

    fn threshold(&self) -> f64 {
        self.inner().threshold()
    }

    fn check_width(&self, width: usize) -> Result<(), String> {
        self.inner().check_width(width)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreeEnsemble {
    #[serde(default, alias = "base_margin")]
    pub base_score: f64,
    pub trees: Vec<Tree>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

/// Splits send `row[feature] < threshold` left; NaN follows `default_left`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default)]
        default_left: bool,
    },
    Leaf {
        leaf: f64,
    },
}

impl Tree {
    fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if let Node::Split { left, right, .. } = node {
                if *left >= self.nodes.len() || *right >= self.nodes.len() {
                    return Err(format!("node {index} points outside the tree"));
                }
            }
        }
        Ok(())
    }

    fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                Node::Split { feature, .. } => Some(*feature),
                Node::Leaf { .. } => None,
            })
            .max()
    }

    fn leaf_value(&self, row: &[f64]) -> Result<f64, PipelineError> {
        let mut index = 0;
        // Each step visits a new node in a well-formed tree.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(Node::Leaf { leaf }) => return Ok(*leaf),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                }) => {
                    let value = row.get(*feature).copied().ok_or_else(|| {
                        PipelineError::processing(format!(
                            "tree reads feature {feature} but the row has {} columns",
                            row.len()
                        ))
                    })?;
                    let go_left = if value.is_nan() {
                        *default_left
                    } else {
                        value < *threshold
                    };
                    index = if go_left { *left } else { *right };
                }
                None => {
                    return Err(PipelineError::processing(format!(
                        "tree node {index} does not exist"
                    )))
                }
            }
        }
        Err(PipelineError::processing("tree traversal did not reach a leaf"))
    }
}

impl TreeEnsemble {
    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("ensemble has no trees".to_string());
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {index}: {e}"))?;
        }
        Ok(())
    }

    pub fn margin(&self, row: &[f64]) -> Result<f64, PipelineError> {
        self.trees
            .iter()
            .try_fold(self.base_score, |sum, tree| Ok(sum + tree.leaf_value(row)?))
    }
}

impl Classifier for TreeEnsemble {
    fn kind(&self) -> &'static str {
        "gradient_boosted_trees"
    }

    fn predict_proba(&self, row: &[f64]) -> Result<f64, PipelineError> {
        Ok(sigmoid(self.margin(row)?))
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn check_width(&self, width: usize) -> Result<(), String> {
        self.validate()?;
        match self.trees.iter().filter_map(Tree::max_feature).max() {
            Some(feature) if feature >= width => Err(format!(
                "trees read feature {feature} but rows have {width} columns"
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Classifier for LogisticModel {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn predict_proba(&self, row: &[f64]) -> Result<f64, PipelineError> {
        if row.len() != self.coefficients.len() {
            return Err(PipelineError::processing(format!(
                "model has {} coefficients but the row has {} columns",
                self.coefficients.len(),
                row.len()
            )));
        }
        let margin = self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(weight, value)| weight * value)
                .sum::<f64>();
        Ok(sigmoid(margin))
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn check_width(&self, width: usize) -> Result<(), String> {
        if self.coefficients.len() != width {
            return Err(format!(
                "{} coefficients for {width} columns",
                self.coefficients.len()
            ));
        }
        Ok(())
    }
}
