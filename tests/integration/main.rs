mod build_tests;
mod splitting_tests;
