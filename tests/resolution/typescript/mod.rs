mod test_definitions;
mod test_imports;
mod test_inheritance;
