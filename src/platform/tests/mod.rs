mod tests_process;
