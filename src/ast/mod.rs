pub mod lookup;
pub mod printer;
pub mod span;
pub mod types;

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

pub use types::Category;

// ── Source ranges ───────────────────────────────────────────────────────

/// A solc `src` attribute: `"start:length:fileIndex"`, offsets in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct SourceRange {
    pub start: usize,
    pub length: usize,
    pub file_index: i64,
}

impl SourceRange {
    pub fn new(start: usize, length: usize, file_index: i64) -> Self {
        Self {
            start,
            length,
            file_index,
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

impl FromStr for SourceRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(format!("invalid source range '{}'", s));
        }
        let start = parts[0]
            .parse()
            .map_err(|_| format!("invalid start in source range '{}'", s))?;
        let length = parts[1]
            .parse()
            .map_err(|_| format!("invalid length in source range '{}'", s))?;
        let file_index = parts[2]
            .parse()
            .map_err(|_| format!("invalid file index in source range '{}'", s))?;
        Ok(Self::new(start, length, file_index))
    }
}

impl TryFrom<String> for SourceRange {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.start, self.length, self.file_index)
    }
}

// ── Type descriptors ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptions {
    #[serde(default)]
    pub type_string: Option<String>,
    #[serde(default)]
    pub type_identifier: Option<String>,
}

impl TypeDescriptions {
    pub fn new(type_string: &str) -> Self {
        Self {
            type_string: Some(type_string.to_string()),
            type_identifier: None,
        }
    }

    pub fn type_string(&self) -> &str {
        self.type_string.as_deref().unwrap_or("")
    }

    pub fn category(&self) -> Category {
        Category::from_type_string(self.type_string())
    }
}

// ── Top-level units ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceUnit {
    #[serde(default)]
    pub absolute_path: String,
    #[serde(default)]
    pub nodes: Vec<SourceUnitPart>,
    #[serde(default)]
    pub src: SourceRange,
}

impl SourceUnit {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn contracts(&self) -> impl Iterator<Item = &ContractDefinition> {
        self.nodes.iter().filter_map(|part| match part {
            SourceUnitPart::ContractDefinition(c) => Some(c),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType")]
pub enum SourceUnitPart {
    ContractDefinition(ContractDefinition),
    FunctionDefinition(FunctionDefinition),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDefinition {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<ContractPart>,
    #[serde(default)]
    pub src: SourceRange,
}

impl ContractDefinition {
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDefinition> {
        self.nodes.iter().filter_map(|part| match part {
            ContractPart::FunctionDefinition(f) => Some(f),
            ContractPart::Other => None,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType")]
pub enum ContractPart {
    FunctionDefinition(FunctionDefinition),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDefinition {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub body: Option<Block>,
    #[serde(default)]
    pub src: SourceRange,
}

// ── Statements ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub statements: Vec<Statement>,
    #[serde(default)]
    pub src: SourceRange,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType")]
pub enum Statement {
    Block(Block),
    UncheckedBlock(Block),
    VariableDeclarationStatement(VariableDeclarationStatement),
    ExpressionStatement(ExpressionStatement),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDeclarationStatement {
    #[serde(default)]
    pub id: i64,
    pub declarations: Vec<Option<VariableDeclaration>>,
    #[serde(default)]
    pub initial_value: Option<Expression>,
    #[serde(default)]
    pub src: SourceRange,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDeclaration {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
    #[serde(default)]
    pub src: SourceRange,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionStatement {
    #[serde(default)]
    pub id: i64,
    pub expression: Expression,
    #[serde(default)]
    pub src: SourceRange,
}

// ── Expressions ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType")]
pub enum Expression {
    Literal(Literal),
    Identifier(Identifier),
    MemberAccess(MemberAccess),
    BinaryOperation(BinaryOperation),
    UnaryOperation(UnaryOperation),
    Assignment(Assignment),
    TupleExpression(TupleExpression),
    FunctionCall(FunctionCall),
    NewExpression(NewExpression),
    IndexAccess(IndexAccess),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LiteralKind {
    Number,
    Bool,
    String,
    HexString,
    UnicodeString,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Literal {
    #[serde(default)]
    pub id: i64,
    pub kind: LiteralKind,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub hex_value: Option<String>,
    #[serde(default)]
    pub subdenomination: Option<String>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
    #[serde(default)]
    pub src: SourceRange,
}

impl Literal {
    /// Source text of the literal. Hex strings only carry `hexValue`.
    pub fn text(&self) -> String {
        match (&self.value, &self.hex_value) {
            (Some(v), _) => v.clone(),
            (None, Some(hex)) => format!("0x{}", hex),
            (None, None) => String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
    #[serde(default)]
    pub src: SourceRange,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberAccess {
    #[serde(default)]
    pub id: i64,
    pub expression: Box<Expression>,
    pub member_name: String,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
    #[serde(default)]
    pub src: SourceRange,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryOperation {
    #[serde(default)]
    pub id: i64,
    pub left_expression: Box<Expression>,
    pub operator: String,
    pub right_expression: Box<Expression>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
    #[serde(default)]
    pub src: SourceRange,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnaryOperation {
    #[serde(default)]
    pub id: i64,
    pub operator: String,
    #[serde(default = "default_prefix")]
    pub prefix: bool,
    pub sub_expression: Box<Expression>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
    #[serde(default)]
    pub src: SourceRange,
}

fn default_prefix() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(default)]
    pub id: i64,
    pub left_hand_side: Box<Expression>,
    pub operator: String,
    pub right_hand_side: Box<Expression>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
    #[serde(default)]
    pub src: SourceRange,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TupleExpression {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub components: Vec<Option<Expression>>,
    #[serde(default)]
    pub is_inline_array: bool,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
    #[serde(default)]
    pub src: SourceRange,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCall {
    #[serde(default)]
    pub id: i64,
    pub expression: Box<Expression>,
    #[serde(default)]
    pub arguments: Vec<Expression>,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
    #[serde(default)]
    pub src: SourceRange,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpression {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
    #[serde(default)]
    pub src: SourceRange,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexAccess {
    #[serde(default)]
    pub id: i64,
    pub base_expression: Box<Expression>,
    #[serde(default)]
    pub index_expression: Option<Box<Expression>>,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
    #[serde(default)]
    pub src: SourceRange,
}
