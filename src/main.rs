fn main() {
    vigil_lib::run()
}
