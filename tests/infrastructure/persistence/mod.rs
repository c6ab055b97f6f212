mod in_memory_job_repository_test;
mod pg_transcript_index_test;
