mod test_exports;
mod test_resolution;
