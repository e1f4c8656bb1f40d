
mod expressions;
mod quantifiers;
mod safety;
