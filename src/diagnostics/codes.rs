use std::fmt;

use serde::Serialize;

/// Stable diagnostic codes. `as_str` is part of the output contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ErrorCode {
    // --- parse ---
    MixedIndentation,
    InvalidIndentMultiplicity,
    InvalidIndentation,
    MissingClosingQuote,
    MissingClosingParenthesis,
    UnexpectedCharacter,
    InvalidEscapeSequence,
    BlockIsNotExpected,

    // --- resolve ---
    NamespacePrefixNotDefined,
    DuplicateNamespaceDefinition,
    AliasIsNotDefined,
    DuplicateAliasDefName,
    AliasDefHasCircularReference,
    ArgumentIsMissing,
    ArgumentIsUnexpected,
    DuplicateArgumentName,
    ValueArgumentIsExpected,
    BlockArgumentIsExpected,
    ArgumentMustBeDefinedInAlias,
    ParameterMustBeDefinedInAliasDefinition,
    DefaultParameterMustBeOnly,
    DefaultBlockArgumentIsMissing,
    DefaultValueArgumentIsMissing,
    DefaultBlockArgumentIsUnexpected,
    DefaultValueArgumentIsUnexpected,
    DocumentMustHaveOneRootElement,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MixedIndentation => "MixedIndentation",
            ErrorCode::InvalidIndentMultiplicity => "InvalidIndentMultiplicity",
            ErrorCode::InvalidIndentation => "InvalidIndentation",
            ErrorCode::MissingClosingQuote => "MissingClosingQuote",
            ErrorCode::MissingClosingParenthesis => "MissingClosingParenthesis",
            ErrorCode::UnexpectedCharacter => "UnexpectedCharacter",
            ErrorCode::InvalidEscapeSequence => "InvalidEscapeSequence",
            ErrorCode::BlockIsNotExpected => "BlockIsNotExpected",
            ErrorCode::NamespacePrefixNotDefined => "NamespacePrefixNotDefined",
            ErrorCode::DuplicateNamespaceDefinition => "DuplicateNamespaceDefinition",
            ErrorCode::AliasIsNotDefined => "AliasIsNotDefined",
            ErrorCode::DuplicateAliasDefName => "DuplicateAliasDefName",
            ErrorCode::AliasDefHasCircularReference => "AliasDefHasCircularReference",
            ErrorCode::ArgumentIsMissing => "ArgumentIsMissing",
            ErrorCode::ArgumentIsUnexpected => "ArgumentIsUnexpected",
            ErrorCode::DuplicateArgumentName => "DuplicateArgumentName",
            ErrorCode::ValueArgumentIsExpected => "ValueArgumentIsExpected",
            ErrorCode::BlockArgumentIsExpected => "BlockArgumentIsExpected",
            ErrorCode::ArgumentMustBeDefinedInAlias => "ArgumentMustBeDefinedInAlias",
            ErrorCode::ParameterMustBeDefinedInAliasDefinition => {
                "ParameterMustBeDefinedInAliasDefinition"
            }
            ErrorCode::DefaultParameterMustBeOnly => "DefaultParameterMustBeOnly",
            ErrorCode::DefaultBlockArgumentIsMissing => "DefaultBlockArgumentIsMissing",
            ErrorCode::DefaultValueArgumentIsMissing => "DefaultValueArgumentIsMissing",
            ErrorCode::DefaultBlockArgumentIsUnexpected => "DefaultBlockArgumentIsUnexpected",
            ErrorCode::DefaultValueArgumentIsUnexpected => "DefaultValueArgumentIsUnexpected",
            ErrorCode::DocumentMustHaveOneRootElement => "DocumentMustHaveOneRootElement",
        }
    }

    /// Numeric code: 1xx parse, 2xx resolve.
    pub fn code(&self) -> u32 {
        match self {
            ErrorCode::MixedIndentation => 101,
            ErrorCode::InvalidIndentMultiplicity => 102,
            ErrorCode::InvalidIndentation => 103,
            ErrorCode::MissingClosingQuote => 104,
            ErrorCode::MissingClosingParenthesis => 105,
            ErrorCode::UnexpectedCharacter => 106,
            ErrorCode::InvalidEscapeSequence => 107,
            ErrorCode::BlockIsNotExpected => 108,
            ErrorCode::NamespacePrefixNotDefined => 201,
            ErrorCode::DuplicateNamespaceDefinition => 202,
            ErrorCode::AliasIsNotDefined => 203,
            ErrorCode::DuplicateAliasDefName => 204,
            ErrorCode::AliasDefHasCircularReference => 205,
            ErrorCode::ArgumentIsMissing => 206,
            ErrorCode::ArgumentIsUnexpected => 207,
            ErrorCode::DuplicateArgumentName => 208,
            ErrorCode::ValueArgumentIsExpected => 209,
            ErrorCode::BlockArgumentIsExpected => 210,
            ErrorCode::ArgumentMustBeDefinedInAlias => 211,
            ErrorCode::ParameterMustBeDefinedInAliasDefinition => 212,
            ErrorCode::DefaultParameterMustBeOnly => 213,
            ErrorCode::DefaultBlockArgumentIsMissing => 214,
            ErrorCode::DefaultValueArgumentIsMissing => 215,
            ErrorCode::DefaultBlockArgumentIsUnexpected => 216,
            ErrorCode::DefaultValueArgumentIsUnexpected => 217,
            ErrorCode::DocumentMustHaveOneRootElement => 218,
        }
    }

    fn template(&self) -> &'static str {
        match self {
            ErrorCode::MixedIndentation => "Mixed indentation: tabs and spaces cannot be combined",
            ErrorCode::InvalidIndentMultiplicity => {
                "Indentation of {0} is not a multiple of the indent unit {1}"
            }
            ErrorCode::InvalidIndentation => "Unexpected indentation",
            ErrorCode::MissingClosingQuote => "Missing closing {0}",
            ErrorCode::MissingClosingParenthesis => "Missing closing parenthesis",
            ErrorCode::UnexpectedCharacter => "Unexpected character '{0}'",
            ErrorCode::InvalidEscapeSequence => "Invalid escape sequence '{0}'",
            ErrorCode::BlockIsNotExpected => "Block is not expected after {0} '{1}'",
            ErrorCode::NamespacePrefixNotDefined => "Namespace prefix '{0}' is not defined",
            ErrorCode::DuplicateNamespaceDefinition => {
                "Namespace prefix '{0}' is already defined in this scope"
            }
            ErrorCode::AliasIsNotDefined => "Alias '{0}' is not defined",
            ErrorCode::DuplicateAliasDefName => "Alias '{0}' is already defined in this scope",
            ErrorCode::AliasDefHasCircularReference => {
                "Alias definition '{0}' has a circular reference"
            }
            ErrorCode::ArgumentIsMissing => "Argument '{0}' is missing in alias '{1}'",
            ErrorCode::ArgumentIsUnexpected => "Alias '{1}' has no parameter '{0}'",
            ErrorCode::DuplicateArgumentName => "Argument '{0}' is already given",
            ErrorCode::ValueArgumentIsExpected => "Value argument is expected for '{0}'",
            ErrorCode::BlockArgumentIsExpected => "Block argument is expected for '{0}'",
            ErrorCode::ArgumentMustBeDefinedInAlias => {
                "Argument '{0}' must be defined inside an alias"
            }
            ErrorCode::ParameterMustBeDefinedInAliasDefinition => {
                "Parameter '{0}' must be defined inside an alias definition"
            }
            ErrorCode::DefaultParameterMustBeOnly => {
                "Default parameter must be the only parameter of '{0}'"
            }
            ErrorCode::DefaultBlockArgumentIsMissing => {
                "Default block argument is missing in alias '{0}'"
            }
            ErrorCode::DefaultValueArgumentIsMissing => {
                "Default value argument is missing in alias '{0}'"
            }
            ErrorCode::DefaultBlockArgumentIsUnexpected => {
                "Alias '{0}' does not take a default block argument"
            }
            ErrorCode::DefaultValueArgumentIsUnexpected => {
                "Alias '{0}' does not take a default value argument"
            }
            ErrorCode::DocumentMustHaveOneRootElement => {
                "Document '{0}' must have exactly one root element"
            }
        }
    }

    /// Fills `{0}`, `{1}`... placeholders of the message template.
    pub fn format(&self, args: &[&str]) -> String {
        let mut message = self.template().to_string();
        for (i, arg) in args.iter().enumerate() {
            message = message.replace(&format!("{{{}}}", i), arg);
        }
        message
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
