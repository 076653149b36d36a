mod test_resolution;
mod test_traits;
