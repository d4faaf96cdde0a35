mod tests_passing;
